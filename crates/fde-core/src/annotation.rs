//! Linguistic annotation capability.
//!
//! Analyzers only ever see [`Document`]s produced through the [`Annotator`]
//! trait. [`HeuristicAnnotator`] is the built-in rule-based provider: regex
//! tokenization, suffix-rule lemmas, closed-class tagging, a shallow
//! dependency labeller and bag-of-lemma sentence similarity.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::stopwords::is_stop_word;
use crate::text::Segment;

/// Coarse part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    Noun,
    Pron,
    Verb,
    Aux,
    Adj,
    Adv,
    Det,
    Adp,
    Cconj,
    Sconj,
    Num,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
    /// Dependency label (`ROOT`, `nsubj`, `dobj`, `pobj`, ...).
    pub dep: String,
    /// Index of the head token within the document; the root points at itself.
    pub head: usize,
    pub is_punct: bool,
    pub is_space: bool,
    /// Byte offset into the segment text.
    pub offset: usize,
}

impl Token {
    /// Counts toward word totals (neither punctuation nor whitespace).
    pub fn is_word(&self) -> bool {
        !self.is_punct && !self.is_space
    }
}

/// One annotated segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub index: usize,
    pub text: String,
    pub tokens: Vec<Token>,
    /// Token ranges, one per sentence, in order.
    pub sentences: Vec<Range<usize>>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens that are neither punctuation nor whitespace.
    pub fn words(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.is_word())
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }

    pub fn sentence(&self, i: usize) -> &[Token] {
        &self.tokens[self.sentences[i].clone()]
    }

    pub fn sentence_text(&self, i: usize) -> &str {
        let tokens = self.sentence(i);
        match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => &self.text[first.offset..last.offset + last.text.len()],
            _ => "",
        }
    }
}

/// Provider of tokens, lemmas, tags, dependencies, sentence boundaries and
/// sentence similarity.
pub trait Annotator: Send + Sync {
    /// Annotate one segment. Failure aborts the whole analysis.
    fn annotate(&self, segment: &Segment) -> Result<Document>;

    /// Similarity in [0, 1] between two sentences of the same document.
    fn sentence_similarity(&self, a: &[Token], b: &[Token]) -> f64;
}

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:'\w+)*|[^\w\s]").unwrap());

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "my", "your", "his", "her", "its",
    "our", "their", "some", "any", "every", "each", "no",
];
const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them", "myself",
    "yourself", "himself", "herself", "itself", "ourselves", "themselves", "who", "what",
    "someone", "something", "everyone", "anyone", "nothing", "everything", "mine", "yours",
    "i'm", "you're", "we're", "they're", "it's", "he's", "she's",
];
const SUBJECT_PRONOUNS: &[&str] = &["i", "you", "he", "she", "it", "we", "they"];
const ADPOSITIONS: &[&str] = &[
    "in", "on", "at", "of", "with", "by", "from", "to", "for", "into", "onto", "over",
    "under", "through", "about", "like", "as", "than", "after", "before", "between",
    "without", "within", "against", "across", "behind", "beyond", "during", "toward",
    "towards", "upon", "among", "around", "near", "off", "out", "up", "down",
];
const AUXILIARIES: &[&str] = &[
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do",
    "does", "did", "will", "would", "shall", "should", "can", "could", "may", "might",
    "must", "can't", "won't", "don't", "didn't", "doesn't", "isn't", "wasn't", "aren't",
    "weren't", "couldn't", "wouldn't", "shouldn't",
];
const COORDINATORS: &[&str] = &["and", "or", "but", "nor", "yet", "so"];
const SUBORDINATORS: &[&str] = &[
    "because", "if", "when", "while", "although", "though", "since", "unless", "whether",
    "where", "whereas", "until",
];
const ADVERBS: &[&str] = &[
    "not", "never", "always", "very", "too", "also", "just", "only", "really", "often",
    "still", "again", "already", "ever", "here", "there", "now", "then", "soon", "maybe",
    "perhaps", "possibly", "probably", "certainly", "definitely", "clearly", "obviously",
    "indeed", "surely", "somehow", "somewhat", "quite", "almost", "even", "away", "back",
    "exactly", "precisely", "absolutely", "undoubtedly", "approximately",
];
const NEGATIONS: &[&str] = &["not", "never", "n't"];
const ADJECTIVES: &[&str] = &[
    "good", "bad", "new", "old", "dark", "pure", "evil", "happy", "sad", "angry", "scared",
    "anxious", "excited", "terrible", "wonderful", "awful", "amazing", "horrific", "ugly",
    "small", "big", "great", "little", "long", "short", "high", "low", "cold", "warm", "hot",
    "young", "strange", "quiet", "empty", "full", "special", "different", "mature", "other",
    "same", "own", "true", "false", "free", "safe", "alone", "uncertain", "unclear",
    "unknown", "broken", "deep", "silent", "lost",
];
const ADJECTIVE_SUFFIXES: &[&str] = &["ful", "ous", "ive", "less", "able", "ible", "ish"];
const VERBS: &[&str] = &[
    "say", "said", "go", "went", "come", "came", "see", "saw", "know", "knew", "think",
    "thought", "feel", "felt", "love", "hate", "fear", "want", "need", "make", "made",
    "take", "took", "give", "gave", "tell", "told", "find", "found", "keep", "kept",
    "leave", "left", "hold", "held", "break", "broke", "trust", "promise", "hurt", "cry",
    "scream", "look", "seem", "seems", "appear", "appears", "believe", "remember", "forget",
    "forgot", "become", "became", "run", "ran", "walk", "speak", "spoke", "hear", "heard",
    "get", "got", "let", "owe", "own", "belong", "understand", "understood", "resembles",
    "reflects", "echoes", "mirrors", "symbolizes", "represents",
];

const IRREGULAR_LEMMAS: &[(&str, &str)] = &[
    ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"),
    ("been", "be"), ("being", "be"), ("has", "have"), ("had", "have"), ("does", "do"),
    ("did", "do"), ("done", "do"), ("went", "go"), ("gone", "go"), ("came", "come"),
    ("saw", "see"), ("seen", "see"), ("knew", "know"), ("known", "know"),
    ("thought", "think"), ("felt", "feel"), ("made", "make"), ("took", "take"),
    ("taken", "take"), ("gave", "give"), ("given", "give"), ("told", "tell"),
    ("found", "find"), ("kept", "keep"), ("left", "leave"), ("held", "hold"),
    ("broke", "break"), ("broken", "break"), ("said", "say"), ("became", "become"),
    ("ran", "run"), ("spoke", "speak"), ("heard", "hear"), ("got", "get"),
    ("forgot", "forget"), ("understood", "understand"), ("children", "child"),
    ("men", "man"), ("women", "woman"), ("feet", "foot"), ("teeth", "tooth"),
    ("mice", "mouse"), ("people", "person"), ("lives", "life"), ("knives", "knife"),
    ("wives", "wife"), ("wolves", "wolf"), ("leaves", "leaf"), ("selves", "self"),
    ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"),
];

/// Words that look inflected but are not.
const LEMMA_EXCEPTIONS: &[&str] = &[
    "always", "perhaps", "sometimes", "towards", "afterwards", "whereas", "besides", "yes",
    "news", "series", "species", "lens", "physics", "chaos", "less", "unless", "thus",
    "plus", "bus", "gas", "canvas", "alas", "this", "his", "its", "us", "was", "has",
    "does", "indeed", "need", "seed", "feed", "bleed", "speed", "proceed", "sacred",
    "naked", "wicked", "hundred", "kindred", "red", "bed", "shed", "nothing", "something",
    "anything", "everything", "morning", "evening", "ceiling", "during", "thing", "king",
    "ring", "sing", "bring", "spring", "string", "wing", "sibling", "darling", "anxious",
];

struct Vocab {
    determiners: HashSet<&'static str>,
    pronouns: HashSet<&'static str>,
    subject_pronouns: HashSet<&'static str>,
    adpositions: HashSet<&'static str>,
    auxiliaries: HashSet<&'static str>,
    coordinators: HashSet<&'static str>,
    subordinators: HashSet<&'static str>,
    adverbs: HashSet<&'static str>,
    negations: HashSet<&'static str>,
    adjectives: HashSet<&'static str>,
    verbs: HashSet<&'static str>,
    irregular: HashMap<&'static str, &'static str>,
    exceptions: HashSet<&'static str>,
}

static VOCAB: LazyLock<Vocab> = LazyLock::new(|| {
    let set = |w: &[&'static str]| w.iter().copied().collect::<HashSet<_>>();
    Vocab {
        determiners: set(DETERMINERS),
        pronouns: set(PRONOUNS),
        subject_pronouns: set(SUBJECT_PRONOUNS),
        adpositions: set(ADPOSITIONS),
        auxiliaries: set(AUXILIARIES),
        coordinators: set(COORDINATORS),
        subordinators: set(SUBORDINATORS),
        adverbs: set(ADVERBS),
        negations: set(NEGATIONS),
        adjectives: set(ADJECTIVES),
        verbs: set(VERBS),
        irregular: IRREGULAR_LEMMAS.iter().copied().collect(),
        exceptions: set(LEMMA_EXCEPTIONS),
    }
});

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// Consonant-vowel-consonant ending with a single vowel, e.g. `lov`, `hop`.
fn is_cvc(stem: &[u8]) -> bool {
    let n = stem.len();
    if n < 2 {
        return false;
    }
    let last = stem[n - 1];
    let vowel = stem[n - 2];
    let before_ok = n < 3 || !is_vowel(stem[n - 3]);
    !is_vowel(last) && !matches!(last, b'w' | b'x' | b'y') && is_vowel(vowel) && before_ok
}

fn undouble(stem: &str) -> Option<&str> {
    let b = stem.as_bytes();
    let n = b.len();
    if n >= 3 && b[n - 1] == b[n - 2] && !is_vowel(b[n - 1]) && !matches!(b[n - 1], b'l' | b's' | b'z')
    {
        Some(&stem[..n - 1])
    } else {
        None
    }
}

/// Rule-based lemma of a lowercase word.
pub fn lemmatize(word: &str) -> String {
    let vocab = &*VOCAB;
    if let Some(lemma) = vocab.irregular.get(word) {
        return (*lemma).to_string();
    }
    if vocab.exceptions.contains(word) || !word.is_ascii() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return word.to_string();
    }
    let n = word.len();

    if n > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..n - 3]);
    }
    if ["sses", "shes", "ches", "xes", "zes"].iter().any(|s| word.ends_with(s)) {
        return word[..n - 2].to_string();
    }
    if n > 3
        && word.ends_with('s')
        && !["ss", "us", "is", "ous"].iter().any(|s| word.ends_with(s))
    {
        return word[..n - 1].to_string();
    }
    if n > 4 && word.ends_with("ied") {
        return format!("{}y", &word[..n - 3]);
    }
    if n > 3 && word.ends_with("ed") && !word.ends_with("eed") {
        let stem = &word[..n - 2];
        if let Some(s) = undouble(stem) {
            return s.to_string();
        }
        if is_cvc(stem.as_bytes()) {
            return format!("{stem}e");
        }
        return stem.to_string();
    }
    if n > 5 && word.ends_with("ing") {
        let stem = &word[..n - 3];
        if let Some(s) = undouble(stem) {
            return s.to_string();
        }
        if is_cvc(stem.as_bytes()) && stem.len() >= 3 {
            return format!("{stem}e");
        }
        return stem.to_string();
    }
    word.to_string()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TagSource {
    Closed,
    List,
    Suffix,
    Default,
}

fn lexical_tag(lower: &str) -> (PartOfSpeech, TagSource) {
    let v = &*VOCAB;
    if !lower.chars().any(|c| c.is_alphanumeric()) {
        return (PartOfSpeech::Punct, TagSource::Closed);
    }
    if lower.chars().all(|c| c.is_ascii_digit()) {
        return (PartOfSpeech::Num, TagSource::Closed);
    }
    let closed = [
        (&v.determiners, PartOfSpeech::Det),
        (&v.pronouns, PartOfSpeech::Pron),
        (&v.auxiliaries, PartOfSpeech::Aux),
        (&v.adpositions, PartOfSpeech::Adp),
        (&v.coordinators, PartOfSpeech::Cconj),
        (&v.subordinators, PartOfSpeech::Sconj),
        (&v.adverbs, PartOfSpeech::Adv),
    ];
    for (set, pos) in closed {
        if set.contains(lower) {
            return (pos, TagSource::Closed);
        }
    }
    if v.adjectives.contains(lower) {
        return (PartOfSpeech::Adj, TagSource::List);
    }
    if v.verbs.contains(lower) {
        return (PartOfSpeech::Verb, TagSource::List);
    }
    if lower.len() > 4 && lower.ends_with("ly") {
        return (PartOfSpeech::Adv, TagSource::Suffix);
    }
    if lower.len() > 4 && (lower.ends_with("ed") || lower.ends_with("ing")) {
        return (PartOfSpeech::Verb, TagSource::Suffix);
    }
    if lower.len() > 5 && ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return (PartOfSpeech::Adj, TagSource::Suffix);
    }
    (PartOfSpeech::Noun, TagSource::Default)
}

/// Lexical tags refined by immediate left/right context.
fn tag_sentence(lowers: &[String]) -> Vec<PartOfSpeech> {
    let v = &*VOCAB;
    let initial: Vec<(PartOfSpeech, TagSource)> = lowers.iter().map(|w| lexical_tag(w)).collect();
    let mut tags: Vec<PartOfSpeech> = initial.iter().map(|(p, _)| *p).collect();

    for i in 0..tags.len() {
        let (pos, source) = initial[i];
        let prev = if i > 0 { Some(tags[i - 1]) } else { None };
        let prev_word = if i > 0 { lowers[i - 1].as_str() } else { "" };
        let next = initial.get(i + 1).map(|(p, _)| *p);

        if pos == PartOfSpeech::Verb
            && source == TagSource::List
            && (matches!(prev, Some(PartOfSpeech::Det) | Some(PartOfSpeech::Adj))
                || (prev.is_none() && next == Some(PartOfSpeech::Aux)))
        {
            tags[i] = PartOfSpeech::Noun;
        } else if pos == PartOfSpeech::Noun && source == TagSource::Default {
            let after_subject = v.subject_pronouns.contains(prev_word);
            let after_aux_or_to = prev == Some(PartOfSpeech::Aux) || prev_word == "to";
            let third_person = matches!(prev, Some(PartOfSpeech::Noun) | Some(PartOfSpeech::Pron))
                && matches!(next, Some(PartOfSpeech::Det) | Some(PartOfSpeech::Pron))
                && lowers[i].ends_with('s');
            if after_subject || after_aux_or_to || third_person {
                tags[i] = PartOfSpeech::Verb;
            }
        }
    }
    tags
}

fn find_root(tags: &[PartOfSpeech]) -> usize {
    let first = |wanted: &[PartOfSpeech]| tags.iter().position(|t| wanted.contains(t));
    first(&[PartOfSpeech::Verb])
        .or_else(|| first(&[PartOfSpeech::Aux]))
        .or_else(|| first(&[PartOfSpeech::Noun, PartOfSpeech::Pron]))
        .or_else(|| tags.iter().position(|t| *t != PartOfSpeech::Punct))
        .unwrap_or(0)
}

/// Shallow dependency labels for one sentence. Heads are sentence-relative.
fn parse_sentence(lowers: &[String], tags: &[PartOfSpeech]) -> Vec<(String, usize)> {
    let v = &*VOCAB;
    let n = tags.len();
    let root = find_root(tags);
    let copular = tags.get(root) == Some(&PartOfSpeech::Aux);
    let mut deps: Vec<(String, usize)> = Vec::with_capacity(n);
    let mut pending_prep: Option<usize> = None;
    let mut seen_object = false;

    for i in 0..n {
        let next_is_noun = tags.get(i + 1) == Some(&PartOfSpeech::Noun);
        let (label, head) = if i == root {
            ("ROOT", i)
        } else {
            match tags[i] {
                PartOfSpeech::Punct => ("punct", root),
                PartOfSpeech::Det => ("det", root),
                PartOfSpeech::Num => ("nummod", root),
                PartOfSpeech::Aux => ("aux", root),
                PartOfSpeech::Cconj => ("cc", root),
                PartOfSpeech::Sconj => ("mark", root),
                PartOfSpeech::Adv if v.negations.contains(lowers[i].as_str()) => ("neg", root),
                PartOfSpeech::Adv => ("advmod", root),
                PartOfSpeech::Adj if copular && i == root + 1 => ("acomp", root),
                PartOfSpeech::Adj => ("amod", root),
                PartOfSpeech::Adp => {
                    pending_prep = Some(i);
                    ("prep", root)
                }
                PartOfSpeech::Verb => {
                    pending_prep = None;
                    if i > 0 && lowers[i - 1] == "to" {
                        ("xcomp", root)
                    } else {
                        ("conj", root)
                    }
                }
                PartOfSpeech::Noun | PartOfSpeech::Pron => {
                    if next_is_noun && tags[i] == PartOfSpeech::Noun {
                        ("compound", i + 1)
                    } else if let Some(prep) = pending_prep.take() {
                        ("pobj", prep)
                    } else if i < root {
                        ("nsubj", root)
                    } else if !seen_object {
                        seen_object = true;
                        if copular { ("attr", root) } else { ("dobj", root) }
                    } else {
                        ("conj", root)
                    }
                }
            }
        };
        deps.push((label.to_string(), head));
    }
    deps
}

/// Token ranges of sentences: a run of `.`/`!`/`?` plus trailing closers ends a sentence.
fn sentence_ranges(texts: &[&str]) -> Vec<Range<usize>> {
    let terminal = |t: &str| matches!(t, "." | "!" | "?");
    let closer = |t: &str| matches!(t, "\"" | "'" | ")" | "]");
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < texts.len() {
        if terminal(texts[i]) {
            let mut end = i + 1;
            while end < texts.len() && (terminal(texts[end]) || closer(texts[end])) {
                end += 1;
            }
            ranges.push(start..end);
            start = end;
            i = end;
        } else {
            i += 1;
        }
    }
    if start < texts.len() {
        ranges.push(start..texts.len());
    }
    ranges
}

fn lemma_counts(tokens: &[Token]) -> HashMap<&str, f64> {
    let mut counts: HashMap<&str, f64> = HashMap::new();
    for t in tokens.iter().filter(|t| t.is_word() && !is_stop_word(&t.lemma)) {
        *counts.entry(t.lemma.as_str()).or_default() += 1.0;
    }
    counts
}

/// Rule-based annotator with no external model.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicAnnotator;

impl HeuristicAnnotator {
    pub fn new() -> Self {
        Self
    }
}

impl Annotator for HeuristicAnnotator {
    fn annotate(&self, segment: &Segment) -> Result<Document> {
        let text = segment.text.as_str();
        let matches: Vec<(usize, &str)> = TOKEN
            .find_iter(text)
            .map(|m| (m.start(), m.as_str()))
            .collect();
        let texts: Vec<&str> = matches.iter().map(|(_, t)| *t).collect();
        let sentences = sentence_ranges(&texts);

        let mut tokens = Vec::with_capacity(matches.len());
        for range in &sentences {
            let lowers: Vec<String> = texts[range.clone()].iter().map(|t| t.to_lowercase()).collect();
            let tags = tag_sentence(&lowers);
            let deps = parse_sentence(&lowers, &tags);
            for (k, (dep, head)) in deps.into_iter().enumerate() {
                let (offset, raw) = matches[range.start + k];
                let is_punct = tags[k] == PartOfSpeech::Punct;
                tokens.push(Token {
                    text: raw.to_string(),
                    lemma: if is_punct {
                        raw.to_string()
                    } else {
                        lemmatize(&lowers[k])
                    },
                    pos: tags[k],
                    dep,
                    head: range.start + head,
                    is_punct,
                    is_space: false,
                    offset,
                });
            }
        }

        Ok(Document {
            index: segment.index,
            text: segment.text.clone(),
            tokens,
            sentences,
        })
    }

    fn sentence_similarity(&self, a: &[Token], b: &[Token]) -> f64 {
        let ca = lemma_counts(a);
        let cb = lemma_counts(b);
        if ca.is_empty() || cb.is_empty() {
            return 0.0;
        }
        let dot: f64 = ca
            .iter()
            .filter_map(|(k, va)| cb.get(k).map(|vb| va * vb))
            .sum();
        let na: f64 = ca.values().map(|v| v * v).sum::<f64>().sqrt();
        let nb: f64 = cb.values().map(|v| v * v).sum::<f64>().sqrt();
        (dot / (na * nb)).clamp(0.0, 1.0)
    }
}
