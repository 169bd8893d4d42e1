//! Observer simulation: fixed personas read sampled segments and report how
//! strongly the text resonates with their reading style.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::{Analyzer, ModuleKind, ModuleReport};
use crate::annotation::Document;
use crate::constants::{
    EMOTIONALITY_SCALE, NEUTRAL_SCORE, PERSONA_SAMPLES, SENTIMENT_MAX_CHARS,
    SENTIMENT_SHIFT_THRESHOLD,
};
use crate::lexicon::{Lexicons, Persona, PersonaStyle};
use crate::stats;

/// Optional sentiment capability. Scores lie in [-1, 1].
pub trait SentimentModel: Send + Sync {
    /// `None` when the model cannot score the text.
    fn score(&self, text: &str) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resonance {
    pub alignment: f64,
    pub tension: f64,
    pub resonance: f64,
    pub emotionality: f64,
    pub factuality: f64,
    pub ambiguity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaResponse {
    pub segment_index: usize,
    pub question: String,
    pub resonance: Resonance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverResponse {
    pub persona: String,
    pub responses: Vec<PersonaResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackLoop {
    pub persona: String,
    pub segments: Vec<usize>,
    pub resonance_trend: Vec<f64>,
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftDirection {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentShift {
    pub from_segment: usize,
    pub to_segment: usize,
    pub direction: ShiftDirection,
    pub magnitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObserverReport {
    pub observer_responses: Vec<ObserverResponse>,
    /// Mean resonance per persona name.
    pub resonance_scores: BTreeMap<String, f64>,
    pub feedback_loops: Vec<FeedbackLoop>,
    pub sentiment_shifts: Vec<SentimentShift>,
}

impl ObserverReport {
    /// Mean of the per-persona resonance scores, 0 when there are none.
    pub fn mean_resonance(&self) -> f64 {
        let scores: Vec<f64> = self.resonance_scores.values().copied().collect();
        stats::mean(&scores)
    }
}

/// Persona-driven reader simulation.
///
/// Segment sampling and question choice draw from the injected generator, so a
/// seeded generator gives reproducible reports. Resonance values themselves
/// are deterministic.
pub struct ObserverSimulation<R: Rng> {
    lexicons: Arc<Lexicons>,
    rng: R,
    sentiment: Option<Box<dyn SentimentModel>>,
}

impl<R: Rng> ObserverSimulation<R> {
    pub fn new(lexicons: Arc<Lexicons>, rng: R) -> Self {
        Self {
            lexicons,
            rng,
            sentiment: None,
        }
    }

    pub fn with_sentiment(mut self, model: Box<dyn SentimentModel>) -> Self {
        self.sentiment = Some(model);
        self
    }

    pub fn sentiment_available(&self) -> bool {
        self.sentiment.is_some()
    }

    pub fn simulate(&mut self, docs: &[Document]) -> ObserverReport {
        if docs.is_empty() {
            return ObserverReport::default();
        }

        let personas = self.lexicons.personas;
        let observer_responses: Vec<ObserverResponse> = personas
            .iter()
            .map(|persona| ObserverResponse {
                persona: persona.name.to_string(),
                responses: self.respond(persona, docs),
            })
            .collect();

        let resonance_scores = observer_responses
            .iter()
            .map(|o| {
                let values: Vec<f64> = o.responses.iter().map(|r| r.resonance.resonance).collect();
                (o.persona.clone(), stats::mean(&values))
            })
            .collect();

        let feedback_loops = observer_responses.iter().filter_map(feedback_loop).collect();
        let sentiment_shifts = self.sentiment_shifts(docs);

        debug!(
            personas = observer_responses.len(),
            sentiment = self.sentiment_available(),
            "observer simulation complete"
        );

        ObserverReport {
            observer_responses,
            resonance_scores,
            feedback_loops,
            sentiment_shifts,
        }
    }

    fn respond(&mut self, persona: &Persona, docs: &[Document]) -> Vec<PersonaResponse> {
        let amount = PERSONA_SAMPLES.min(docs.len());
        let mut indices = rand::seq::index::sample(&mut self.rng, docs.len(), amount).into_vec();
        indices.sort_unstable();

        indices
            .into_iter()
            .map(|i| {
                let question = persona
                    .questions
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or_default();
                PersonaResponse {
                    segment_index: docs[i].index,
                    question: question.to_string(),
                    resonance: resonance(&self.lexicons, &docs[i], persona.style),
                }
            })
            .collect()
    }

    fn sentiment_shifts(&self, docs: &[Document]) -> Vec<SentimentShift> {
        let Some(model) = self.sentiment.as_deref() else {
            return Vec::new();
        };
        if docs.len() < 2 {
            return Vec::new();
        }
        let scores: Vec<f64> = docs
            .iter()
            .map(|d| {
                let head: String = d.text.chars().take(SENTIMENT_MAX_CHARS).collect();
                model.score(&head).unwrap_or(0.0)
            })
            .collect();

        scores
            .windows(2)
            .enumerate()
            .filter_map(|(i, w)| {
                let shift = w[1] - w[0];
                (shift.abs() > SENTIMENT_SHIFT_THRESHOLD).then(|| SentimentShift {
                    from_segment: i,
                    to_segment: i + 1,
                    direction: if shift > 0.0 {
                        ShiftDirection::Positive
                    } else {
                        ShiftDirection::Negative
                    },
                    magnitude: shift.abs(),
                })
            })
            .collect()
    }
}

impl<R: Rng + Send> Analyzer for ObserverSimulation<R> {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Observer
    }

    fn analyze(&mut self, docs: &[Document]) -> ModuleReport {
        ModuleReport::Observer(self.simulate(docs))
    }
}

/// A persona whose resonance rises at every step of its sampled segments.
fn feedback_loop(observer: &ObserverResponse) -> Option<FeedbackLoop> {
    let trend: Vec<f64> = observer.responses.iter().map(|r| r.resonance.resonance).collect();
    if trend.len() < 2 || !trend.windows(2).all(|w| w[1] > w[0]) {
        return None;
    }
    Some(FeedbackLoop {
        persona: observer.persona.clone(),
        segments: observer.responses.iter().map(|r| r.segment_index).collect(),
        strength: trend[trend.len() - 1] - trend[0],
        resonance_trend: trend,
    })
}

fn emotionality(lex: &Lexicons, doc: &Document) -> f64 {
    let hits = doc
        .tokens
        .iter()
        .filter(|t| lex.emotional_words.contains(t.lemma.to_lowercase().as_str()))
        .count();
    (EMOTIONALITY_SCALE * hits as f64 / doc.len().max(1) as f64).min(1.0)
}

fn factuality(lex: &Lexicons, doc: &Document) -> f64 {
    let (mut factual, mut opinion) = (0usize, 0usize);
    for t in &doc.tokens {
        let lemma = t.lemma.to_lowercase();
        if lex.factual_indicators.contains(lemma.as_str()) {
            factual += 1;
        } else if lex.opinion_indicators.contains(lemma.as_str()) {
            opinion += 1;
        }
    }
    match factual + opinion {
        0 => NEUTRAL_SCORE,
        total => factual as f64 / total as f64,
    }
}

fn ambiguity(lex: &Lexicons, doc: &Document) -> f64 {
    let (mut ambiguous, mut certain) = (0usize, 0usize);
    for t in &doc.tokens {
        let lemma = t.lemma.to_lowercase();
        if lex.ambiguity_markers.contains(lemma.as_str()) {
            ambiguous += 1;
        } else if lex.certainty_markers.contains(lemma.as_str()) {
            certain += 1;
        }
    }
    ambiguous += doc
        .tokens
        .windows(2)
        .filter(|w| {
            let bigram = format!("{} {}", w[0].text.to_lowercase(), w[1].text.to_lowercase());
            lex.ambiguity_bigrams.contains(bigram.as_str())
        })
        .count();
    match ambiguous + certain {
        0 => NEUTRAL_SCORE,
        total => ambiguous as f64 / total as f64,
    }
}

/// Style-weighted resonance of one segment for one persona.
pub fn resonance(lex: &Lexicons, doc: &Document, style: PersonaStyle) -> Resonance {
    let e = emotionality(lex, doc);
    let f = factuality(lex, doc);
    let a = ambiguity(lex, doc);

    let (alignment, tension) = match style {
        PersonaStyle::Clinical => (0.5 * (1.0 - e) + 0.5 * f, 0.7 * e + 0.3 * a),
        PersonaStyle::Empathetic => (0.7 * e + 0.3 * (1.0 - f), 0.5 * (1.0 - e) + 0.5 * f),
        PersonaStyle::Skeptical => (0.3 * f + 0.7 * a, 0.5 * (1.0 - f) + 0.5 * (1.0 - a)),
    };

    Resonance {
        alignment,
        tension,
        resonance: alignment - tension,
        emotionality: e,
        factuality: f,
        ambiguity: a,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotator, HeuristicAnnotator};
    use crate::text::Segment;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn docs(texts: &[&str]) -> Vec<Document> {
        texts
            .iter()
            .enumerate()
            .map(|(index, t)| {
                HeuristicAnnotator
                    .annotate(&Segment {
                        index,
                        text: t.to_string(),
                    })
                    .unwrap()
            })
            .collect()
    }

    struct FixedSentiment(Vec<(&'static str, f64)>);

    impl SentimentModel for FixedSentiment {
        fn score(&self, text: &str) -> Option<f64> {
            self.0
                .iter()
                .find(|(prefix, _)| text.starts_with(prefix))
                .map(|(_, s)| *s)
        }
    }

    #[test]
    fn test_three_personas_sample_sorted_distinct() {
        let d = docs(&["one a.", "two b.", "three c.", "four d.", "five e."]);
        let report = ObserverSimulation::new(Lexicons::standard(), rng()).simulate(&d);
        assert_eq!(report.observer_responses.len(), 3);
        for o in &report.observer_responses {
            assert_eq!(o.responses.len(), 3);
            let idx: Vec<usize> = o.responses.iter().map(|r| r.segment_index).collect();
            assert!(idx.windows(2).all(|w| w[0] < w[1]));
        }
        assert_eq!(report.resonance_scores.len(), 3);
        assert!(report.resonance_scores.contains_key("Skeptical_Analyst"));
    }

    #[test]
    fn test_sampling_capped_by_segment_count() {
        let d = docs(&["only one segment"]);
        let report = ObserverSimulation::new(Lexicons::standard(), rng()).simulate(&d);
        for o in &report.observer_responses {
            assert_eq!(o.responses.len(), 1);
            assert_eq!(o.responses[0].segment_index, 0);
        }
        assert!(report.feedback_loops.is_empty());
    }

    #[test]
    fn test_same_seed_same_report() {
        let d = docs(&["alpha.", "beta.", "gamma.", "delta.", "epsilon.", "zeta."]);
        let a = ObserverSimulation::new(Lexicons::standard(), rng()).simulate(&d);
        let b = ObserverSimulation::new(Lexicons::standard(), rng()).simulate(&d);
        assert_eq!(a, b);
    }

    #[test]
    fn test_resonance_neutral_text() {
        let lex = Lexicons::standard();
        let d = docs(&["The table stands there."]);
        let r = resonance(&lex, &d[0], PersonaStyle::Clinical);
        assert_eq!(r.emotionality, 0.0);
        assert_eq!(r.factuality, 0.5);
        assert_eq!(r.ambiguity, 0.5);
        assert_relative_eq!(r.alignment, 0.75);
        assert_relative_eq!(r.tension, 0.15);
        assert_relative_eq!(r.resonance, 0.6);
    }

    #[test]
    fn test_emotionality_counts_all_tokens() {
        let lex = Lexicons::standard();
        // 1 emotional hit over 5 tokens including the period.
        let d = docs(&["I love the sea."]);
        let r = resonance(&lex, &d[0], PersonaStyle::Empathetic);
        assert_relative_eq!(r.emotionality, 1.0);
        let d = docs(&["I love the grey sea and the old stone wall today."]);
        let r = resonance(&lex, &d[0], PersonaStyle::Empathetic);
        assert_relative_eq!(r.emotionality, 5.0 / 12.0);
    }

    #[test]
    fn test_factuality_and_ambiguity_ratios() {
        let lex = Lexicons::standard();
        let d = docs(&["The evidence is clear but maybe I think it is sort of wrong."]);
        let r = resonance(&lex, &d[0], PersonaStyle::Skeptical);
        // factual: evidence; opinion: maybe, think
        assert_relative_eq!(r.factuality, 1.0 / 3.0);
        // ambiguous: maybe + "sort of"; certain: none
        assert_relative_eq!(r.ambiguity, 1.0);
    }

    #[test]
    fn test_feedback_loop_requires_strict_increase() {
        let make = |values: &[f64]| ObserverResponse {
            persona: "P".into(),
            responses: values
                .iter()
                .enumerate()
                .map(|(i, v)| PersonaResponse {
                    segment_index: i,
                    question: String::new(),
                    resonance: Resonance {
                        alignment: 0.0,
                        tension: 0.0,
                        resonance: *v,
                        emotionality: 0.0,
                        factuality: 0.0,
                        ambiguity: 0.0,
                    },
                })
                .collect(),
        };
        let lp = feedback_loop(&make(&[0.1, 0.2, 0.5])).unwrap();
        assert_relative_eq!(lp.strength, 0.4);
        assert_eq!(lp.segments, vec![0, 1, 2]);
        assert!(feedback_loop(&make(&[0.1, 0.1, 0.5])).is_none());
        assert!(feedback_loop(&make(&[0.3])).is_none());
    }

    #[test]
    fn test_sentiment_unavailable_is_empty() {
        let d = docs(&["Joy everywhere.", "Grief everywhere."]);
        let mut sim = ObserverSimulation::new(Lexicons::standard(), rng());
        assert!(!sim.sentiment_available());
        assert!(sim.simulate(&d).sentiment_shifts.is_empty());
    }

    #[test]
    fn test_sentiment_shift_detected() {
        let d = docs(&["Joy everywhere.", "Grief everywhere.", "Grief again."]);
        let model = FixedSentiment(vec![("Joy", 0.9), ("Grief", -0.8)]);
        let mut sim =
            ObserverSimulation::new(Lexicons::standard(), rng()).with_sentiment(Box::new(model));
        assert!(sim.sentiment_available());
        let shifts = sim.simulate(&d).sentiment_shifts;
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].from_segment, 0);
        assert_eq!(shifts[0].to_segment, 1);
        assert_eq!(shifts[0].direction, ShiftDirection::Negative);
        assert_relative_eq!(shifts[0].magnitude, 1.7);
    }
}
