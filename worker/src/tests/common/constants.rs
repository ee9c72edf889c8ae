pub const HEAD_COMMIT: &str = "6d8cbd1c3b30c4b8bd4a0bfc2a0d4e0d3f0e8a2b";
pub const MODEL_ANSWER: &str = "The model answer";
pub const GENERATED_JSONL: &str = "{\"instruction\":\"Tell a joke\",\"output\":\"Why did the chicken cross the road?\"}\n";

pub const SKILL_PATH: &str = "compositional_skills/writing/freeform/jokes/qna.yaml";
pub const KNOWLEDGE_PATH: &str = "knowledge/science/astronomy/constellations/phoenix/qna.yaml";

pub const SKILL_QNA: &str = r#"version: 2
task_description: Tell jokes
created_by: contributor
seed_examples:
  - question: Tell me a joke about cats
    answer: Cats are purrfect.
  - question: Summarize the --verbose joke
    answer: It is loud.
    context: A joke about the --verbose flag.
  - question: What is a pun?
    answer: Wordplay.
"#;

pub const SKILL_QNA_MISSING_ANSWER: &str = r#"version: 2
task_description: Tell jokes
created_by: contributor
seed_examples:
  - question: Tell me a joke about cats
    answer: Cats are purrfect.
  - question: This example has no answer
  - question: What is a pun?
    answer: Wordplay.
"#;

pub const KNOWLEDGE_QNA: &str = r#"version: 3
domain: astronomy
created_by: contributor
seed_examples:
  - context: Phoenix is a minor constellation in the southern sky.
    questions_and_answers:
      - question: What is Phoenix?
        answer: A minor constellation.
      - question: Where is Phoenix?
        answer: In the southern sky.
document_outline: The constellation Phoenix
document:
  repo: https://github.com/contributor/knowledge
  commit: 0a1f2672b9b90582e6115333e3ed62fd628f1c0f
  patterns:
    - phoenix.md
"#;

pub const NO_SEED_EXAMPLES: &str = "version: 2\ntask_description: nothing to check\n";
