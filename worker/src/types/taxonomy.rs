use crate::error::job::taxonomy::TaxonomyError;
use crate::types::constant::KNOWLEDGE_FOLDER;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use strum_macros::Display;

const SEED_EXAMPLES_KEY: &str = "seed_examples";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TaxonomyDomain {
    #[strum(serialize = "skill")]
    Skill,
    #[strum(serialize = "knowledge")]
    Knowledge,
}

impl TaxonomyDomain {
    /// Classifies a path relative to the taxonomy root, as printed by `ilab taxonomy diff`.
    pub fn classify(relative_path: &str) -> Self {
        if relative_path.starts_with(KNOWLEDGE_FOLDER) {
            TaxonomyDomain::Knowledge
        } else {
            TaxonomyDomain::Skill
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SkillSeed {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeSeed {
    pub context: String,
    pub questions_and_answers: Vec<QuestionAnswer>,
}

#[derive(Deserialize)]
struct RawKnowledgeSeed {
    context: String,
    questions_and_answers: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedExamples {
    Skill(Vec<SkillSeed>),
    Knowledge(Vec<KnowledgeSeed>),
}

/// A decoded taxonomy file. Malformed examples are kept aside in `rejected`
/// so the caller can report them while processing the valid ones.
#[derive(Debug)]
pub struct TaxonomyFile {
    pub examples: SeedExamples,
    pub rejected: Vec<TaxonomyError>,
}

impl TaxonomyFile {
    pub fn parse(content: &str, domain: TaxonomyDomain) -> Result<Self, TaxonomyError> {
        let document = parse_document(content)?;
        let seeds = seed_examples(&document)?;
        let mut rejected = Vec::new();

        let examples = match domain {
            TaxonomyDomain::Skill => {
                let mut skills = Vec::with_capacity(seeds.len());
                for (index, seed) in seeds.iter().enumerate() {
                    match serde_yaml::from_value::<SkillSeed>(seed.clone()) {
                        Ok(skill) => skills.push(skill),
                        Err(e) => rejected.push(TaxonomyError::InvalidExample { index, reason: e.to_string() }),
                    }
                }
                SeedExamples::Skill(skills)
            }
            TaxonomyDomain::Knowledge => {
                let mut knowledge = Vec::with_capacity(seeds.len());
                for (index, seed) in seeds.iter().enumerate() {
                    let raw = match serde_yaml::from_value::<RawKnowledgeSeed>(seed.clone()) {
                        Ok(raw) => raw,
                        Err(e) => {
                            rejected.push(TaxonomyError::InvalidExample { index, reason: e.to_string() });
                            continue;
                        }
                    };
                    let mut pairs = Vec::with_capacity(raw.questions_and_answers.len());
                    for (pair, value) in raw.questions_and_answers.into_iter().enumerate() {
                        match serde_yaml::from_value::<QuestionAnswer>(value) {
                            Ok(qna) => pairs.push(qna),
                            Err(e) => rejected.push(TaxonomyError::InvalidPair { index, pair, reason: e.to_string() }),
                        }
                    }
                    knowledge.push(KnowledgeSeed { context: raw.context, questions_and_answers: pairs });
                }
                SeedExamples::Knowledge(knowledge)
            }
        };

        Ok(Self { examples, rejected })
    }

    /// Number of chat invocations the file yields
    pub fn unit_count(&self) -> usize {
        match &self.examples {
            SeedExamples::Skill(skills) => skills.len(),
            SeedExamples::Knowledge(seeds) => seeds.iter().map(|seed| seed.questions_and_answers.len()).sum(),
        }
    }
}

/// Decodes a taxonomy document, keeping every field, and checks that it carries a seed example sequence.
pub fn parse_document(content: &str) -> Result<Mapping, TaxonomyError> {
    let value: Value = serde_yaml::from_str(content)?;
    let Value::Mapping(document) = value else {
        return Err(TaxonomyError::MissingSeedExamples);
    };
    seed_examples(&document)?;
    Ok(document)
}

fn seed_examples(document: &Mapping) -> Result<&Vec<Value>, TaxonomyError> {
    match document.get(SEED_EXAMPLES_KEY) {
        Some(Value::Sequence(seeds)) => Ok(seeds),
        _ => Err(TaxonomyError::MissingSeedExamples),
    }
}

/// Truncates the seed examples to `max_seed` entries. Returns the original count when trimming happened.
pub fn cap_seed_examples(document: &mut Mapping, max_seed: usize) -> Option<usize> {
    match document.get_mut(SEED_EXAMPLES_KEY) {
        Some(Value::Sequence(seeds)) if seeds.len() > max_seed => {
            let original = seeds.len();
            seeds.truncate(max_seed);
            Some(original)
        }
        _ => None,
    }
}
