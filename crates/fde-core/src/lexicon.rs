//! Fixed vocabulary tables shared by every analyzer.
//!
//! Built once per process and handed out as `Arc<Lexicons>`; nothing here is
//! mutated after construction.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Symbol lexicon category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolCategory {
    Emotional,
    Physical,
    Abstract,
}

impl SymbolCategory {
    pub const ALL: [SymbolCategory; 3] = [
        SymbolCategory::Emotional,
        SymbolCategory::Physical,
        SymbolCategory::Abstract,
    ];
}

const EMOTIONAL_SYMBOLS: &[(&str, f64)] = &[
    ("family", 0.7), ("child", 0.75), ("love", 0.8), ("heart", 0.7), ("pain", 0.8),
    ("fear", 0.85), ("death", 0.9), ("life", 0.7), ("soul", 0.8), ("spirit", 0.75),
    ("blood", 0.8), ("god", 0.85), ("heaven", 0.8), ("hell", 0.85), ("angel", 0.75),
    ("demon", 0.85), ("devil", 0.9), ("evil", 0.85), ("good", 0.7), ("pure", 0.75),
    ("dark", 0.8), ("light", 0.8), ("shadow", 0.85), ("secret", 0.8), ("truth", 0.75),
    ("lie", 0.8), ("power", 0.75), ("control", 0.8), ("freedom", 0.8), ("prison", 0.85),
    ("cage", 0.85), ("trap", 0.8), ("escape", 0.75), ("voice", 0.7), ("silence", 0.75),
    ("cry", 0.8), ("tear", 0.75), ("smile", 0.7), ("laugh", 0.7), ("scream", 0.85),
    ("touch", 0.75), ("hurt", 0.8), ("heal", 0.7), ("wound", 0.8), ("scar", 0.85),
    ("break", 0.75), ("fix", 0.7), ("trust", 0.8), ("betray", 0.85), ("promise", 0.75),
];

const PHYSICAL_SYMBOLS: &[(&str, f64)] = &[
    ("door", 0.7), ("window", 0.7), ("mirror", 0.8), ("knife", 0.85), ("gun", 0.9),
    ("fire", 0.8), ("water", 0.7), ("earth", 0.7), ("air", 0.7), ("stone", 0.7),
    ("wall", 0.75), ("chain", 0.85), ("rope", 0.8), ("mask", 0.85), ("key", 0.8),
    ("lock", 0.8), ("box", 0.7), ("gift", 0.7), ("throne", 0.8), ("crown", 0.8),
    ("sword", 0.8), ("shield", 0.75), ("bridge", 0.7), ("path", 0.7), ("road", 0.7),
    ("star", 0.75), ("sun", 0.75), ("moon", 0.75), ("eye", 0.8), ("hand", 0.7),
    ("heart", 0.8), ("head", 0.7), ("body", 0.7), ("flesh", 0.8), ("bone", 0.75),
    ("blood", 0.8), ("tear", 0.8), ("rose", 0.75), ("flower", 0.7), ("tree", 0.7),
    ("forest", 0.75), ("mountain", 0.7), ("sea", 0.75), ("river", 0.7), ("island", 0.7),
];

const ABSTRACT_SYMBOLS: &[(&str, f64)] = &[
    ("time", 0.7), ("memory", 0.8), ("dream", 0.8), ("nightmare", 0.85), ("hope", 0.75),
    ("despair", 0.85), ("fate", 0.8), ("destiny", 0.8), ("chance", 0.7), ("luck", 0.7),
    ("justice", 0.75), ("mercy", 0.75), ("vengeance", 0.8), ("revenge", 0.8),
    ("forgiveness", 0.75), ("sin", 0.85), ("virtue", 0.75), ("innocence", 0.8),
    ("guilt", 0.8), ("shame", 0.85), ("honor", 0.75), ("pride", 0.75), ("humility", 0.7),
    ("courage", 0.75), ("fear", 0.8), ("love", 0.8), ("hate", 0.85), ("passion", 0.75),
    ("desire", 0.8), ("lust", 0.85), ("greed", 0.8), ("envy", 0.8), ("wrath", 0.85),
    ("sloth", 0.7), ("gluttony", 0.75), ("wisdom", 0.7), ("knowledge", 0.7),
    ("truth", 0.8), ("lie", 0.8), ("reality", 0.75),
];

const GROOMING_PATTERNS: &[&str] = &[
    "our secret", "special relationship", "just between us", "no one will understand",
    "others would be jealous", "you're so mature", "you're different", "you're special",
    "you understand me", "i trust you", "do you trust me", "prove your love",
    "if you love me", "need you", "can't live without you", "no one else matters",
    "they're trying to separate us", "they're jealous", "they don't understand",
    "you belong to me", "you're mine", "i own you", "you owe me", "after all i've done",
    "look what you made me do", "this is your fault", "you asked for this",
    "you wanted this", "you deserve this", "you need to be punished", "teach you a lesson",
];

const METAPHOR_INDICATORS: &[&str] = &[
    "like", "as", "than", "seems", "appears", "resembles", "reflects", "echoes", "mirrors",
    "symbolizes", "represents",
];

const EMOTIONAL_WORDS: &[&str] = &[
    "love", "hate", "fear", "angry", "sad", "happy", "worry", "scared", "anxious",
    "excited", "terrible", "wonderful", "awful", "amazing", "horrific", "beautiful", "ugly",
];

const FACTUAL_INDICATORS: &[&str] = &[
    "fact", "evidence", "data", "research", "study", "statistic", "measured", "observed",
    "documented",
];

const OPINION_INDICATORS: &[&str] = &[
    "think", "believe", "feel", "sense", "seems", "appears", "might", "could", "perhaps",
    "maybe",
];

const AMBIGUITY_MARKERS: &[&str] = &[
    "maybe", "perhaps", "possibly", "might", "could", "uncertain", "unclear", "unknown",
    "somewhat", "somehow", "sort of", "kind of", "approximately",
];

const AMBIGUITY_BIGRAMS: &[&str] = &["sort of", "kind of"];

const CERTAINTY_MARKERS: &[&str] = &[
    "definitely", "certainly", "absolutely", "clearly", "obviously", "undoubtedly",
    "precisely", "exactly", "surely", "indeed", "without doubt",
];

/// How a persona weighs emotionality, factuality and ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaStyle {
    Clinical,
    Empathetic,
    Skeptical,
}

/// A simulated analyst reading the text.
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: &'static str,
    pub description: &'static str,
    pub style: PersonaStyle,
    pub questions: &'static [&'static str],
}

const PERSONAS: &[Persona] = &[
    Persona {
        name: "Clinical_Objective",
        description: "A clinical, objective observer who focuses on facts and avoids emotional language.",
        style: PersonaStyle::Clinical,
        questions: &[
            "What specific language patterns are evident in this text?",
            "How does the narrative structure change throughout the text?",
            "What factual inconsistencies appear in the account?",
            "What is the frequency of first-person vs. third-person references?",
            "How does the terminology evolve through different segments?",
        ],
    },
    Persona {
        name: "Empathetic_Supporter",
        description: "An empathetic observer who responds with emotional support and validation.",
        style: PersonaStyle::Empathetic,
        questions: &[
            "How might the emotional state of the author shift throughout the text?",
            "What unsaid emotions seem to underlie the narrative?",
            "Where does the text show signs of emotional processing or blockage?",
            "How might the author be seeking validation or support?",
            "What emotional responses might this text evoke in different readers?",
        ],
    },
    Persona {
        name: "Skeptical_Analyst",
        description: "A skeptical observer who questions assertions and looks for logical fallacies.",
        style: PersonaStyle::Skeptical,
        questions: &[
            "What claims in this text lack sufficient evidence?",
            "How might confirmation bias be operating in this narrative?",
            "What alternative explanations exist for the described events?",
            "Where does the reasoning show signs of circular logic?",
            "What unstated assumptions underlie the main assertions?",
        ],
    },
];

/// A compiled grooming phrase.
#[derive(Debug)]
pub struct GroomingPattern {
    pub pattern: &'static str,
    pub regex: Regex,
}

/// Every fixed table the analyzers consult.
#[derive(Debug)]
pub struct Lexicons {
    banks: HashMap<SymbolCategory, HashMap<&'static str, f64>>,
    merged: HashMap<&'static str, f64>,
    pub grooming: Vec<GroomingPattern>,
    pub metaphor_indicators: HashSet<&'static str>,
    pub emotional_words: HashSet<&'static str>,
    pub factual_indicators: HashSet<&'static str>,
    pub opinion_indicators: HashSet<&'static str>,
    pub ambiguity_markers: HashSet<&'static str>,
    pub ambiguity_bigrams: HashSet<&'static str>,
    pub certainty_markers: HashSet<&'static str>,
    pub personas: &'static [Persona],
}

static STANDARD: LazyLock<Arc<Lexicons>> = LazyLock::new(|| Arc::new(Lexicons::build()));

impl Lexicons {
    /// The process-wide standard tables.
    pub fn standard() -> Arc<Lexicons> {
        Arc::clone(&STANDARD)
    }

    fn build() -> Self {
        let mut banks = HashMap::new();
        banks.insert(SymbolCategory::Emotional, EMOTIONAL_SYMBOLS.iter().copied().collect());
        banks.insert(SymbolCategory::Physical, PHYSICAL_SYMBOLS.iter().copied().collect());
        banks.insert(SymbolCategory::Abstract, ABSTRACT_SYMBOLS.iter().copied().collect());

        // Later banks override earlier weights for shared lemmas.
        let mut merged = HashMap::new();
        for table in [EMOTIONAL_SYMBOLS, PHYSICAL_SYMBOLS, ABSTRACT_SYMBOLS] {
            merged.extend(table.iter().copied());
        }

        let grooming = GROOMING_PATTERNS
            .iter()
            .map(|p| GroomingPattern {
                pattern: p,
                regex: Regex::new(&format!("(?i){}", regex::escape(p))).unwrap(),
            })
            .collect();

        let set = |words: &[&'static str]| words.iter().copied().collect::<HashSet<_>>();

        Self {
            banks,
            merged,
            grooming,
            metaphor_indicators: set(METAPHOR_INDICATORS),
            emotional_words: set(EMOTIONAL_WORDS),
            factual_indicators: set(FACTUAL_INDICATORS),
            opinion_indicators: set(OPINION_INDICATORS),
            ambiguity_markers: set(AMBIGUITY_MARKERS),
            ambiguity_bigrams: set(AMBIGUITY_BIGRAMS),
            certainty_markers: set(CERTAINTY_MARKERS),
            personas: PERSONAS,
        }
    }

    /// Merged symbol weight for a lowercase lemma.
    pub fn symbol_weight(&self, lemma: &str) -> Option<f64> {
        self.merged.get(lemma).copied()
    }

    /// Whether a category's own bank contains the lemma.
    pub fn in_category(&self, category: SymbolCategory, lemma: &str) -> bool {
        self.banks
            .get(&category)
            .is_some_and(|bank| bank.contains_key(lemma))
    }

    pub fn category_len(&self, category: SymbolCategory) -> usize {
        self.banks.get(&category).map_or(0, |bank| bank.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_sizes() {
        let lex = Lexicons::standard();
        assert_eq!(lex.category_len(SymbolCategory::Emotional), 50);
        assert_eq!(lex.category_len(SymbolCategory::Physical), 45);
        assert_eq!(lex.category_len(SymbolCategory::Abstract), 40);
    }

    #[test]
    fn test_merged_later_bank_wins() {
        let lex = Lexicons::standard();
        // heart: emotional 0.7, physical 0.8
        assert_eq!(lex.symbol_weight("heart"), Some(0.8));
        // fear: emotional 0.85, abstract 0.8
        assert_eq!(lex.symbol_weight("fear"), Some(0.8));
        assert_eq!(lex.symbol_weight("death"), Some(0.9));
        assert_eq!(lex.symbol_weight("table"), None);
    }

    #[test]
    fn test_grooming_patterns_case_insensitive() {
        let lex = Lexicons::standard();
        assert_eq!(lex.grooming.len(), 31);
        let p = lex.grooming.iter().find(|g| g.pattern == "our secret").unwrap();
        assert!(p.regex.is_match("This is OUR SECRET."));
    }

    #[test]
    fn test_shared_instance() {
        let a = Lexicons::standard();
        let b = Lexicons::standard();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_three_personas() {
        let lex = Lexicons::standard();
        let styles: Vec<_> = lex.personas.iter().map(|p| p.style).collect();
        assert_eq!(
            styles,
            vec![PersonaStyle::Clinical, PersonaStyle::Empathetic, PersonaStyle::Skeptical]
        );
        assert!(lex.personas.iter().all(|p| p.questions.len() == 5));
    }
}
