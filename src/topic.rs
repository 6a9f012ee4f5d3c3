// Topic scoring
// Fits a single-topic LDA over an event's documents and reduces the
// top keyword weights to one confidence value per event

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::metrics::TOPIC_FIT_DURATION;
use crate::text::TextNormalizer;

/// Term ids by first appearance, with document frequencies.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    token2id: HashMap<String, usize>,
    id2token: Vec<String>,
    dfs: Vec<usize>,
    num_docs: usize,
}

impl Dictionary {
    pub fn from_documents(texts: &[Vec<String>]) -> Self {
        let mut dict = Self::default();
        for text in texts {
            dict.num_docs += 1;
            let mut seen = vec![false; dict.id2token.len()];
            for token in text {
                let id = match dict.token2id.get(token) {
                    Some(&id) => id,
                    None => {
                        let id = dict.id2token.len();
                        dict.token2id.insert(token.clone(), id);
                        dict.id2token.push(token.clone());
                        dict.dfs.push(0);
                        seen.push(false);
                        id
                    }
                };
                if !seen[id] {
                    seen[id] = true;
                    dict.dfs[id] += 1;
                }
            }
        }
        dict
    }

    /// Keeps terms whose document fraction is strictly inside `(no_below, no_above)`.
    pub fn filter_extremes(&mut self, no_below: f64, no_above: f64) {
        if self.num_docs == 0 {
            return;
        }
        let n = self.num_docs as f64;
        let kept: Vec<(String, usize)> = self
            .id2token
            .drain(..)
            .zip(self.dfs.drain(..))
            .filter(|(_, df)| {
                let frac = *df as f64 / n;
                frac > no_below && frac < no_above
            })
            .collect();

        self.token2id.clear();
        for (id, (token, df)) in kept.into_iter().enumerate() {
            self.token2id.insert(token.clone(), id);
            self.id2token.push(token);
            self.dfs.push(df);
        }
    }

    /// Sparse `(term id, count)` pairs, ordered by id; unknown tokens are dropped.
    pub fn doc2bow(&self, text: &[String]) -> Vec<(usize, usize)> {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for token in text {
            if let Some(&id) = self.token2id.get(token) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        let mut bow: Vec<(usize, usize)> = counts.into_iter().collect();
        bow.sort_unstable();
        bow
    }

    pub fn term(&self, id: usize) -> Option<&str> {
        self.id2token.get(id).map(String::as_str)
    }

    pub fn doc_freq(&self, token: &str) -> Option<usize> {
        self.token2id.get(token).map(|&id| self.dfs[id])
    }

    pub fn len(&self) -> usize {
        self.id2token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2token.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Corpus {
    pub docs: Vec<Vec<(usize, usize)>>,
    pub num_terms: usize,
}

impl Corpus {
    pub fn new(dictionary: &Dictionary, texts: &[Vec<String>]) -> Self {
        Self {
            docs: texts.iter().map(|t| dictionary.doc2bow(t)).collect(),
            num_terms: dictionary.len(),
        }
    }
}

/// Topic-word distributions, one row per topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicWeights {
    pub topics: Vec<Vec<f64>>,
}

impl TopicWeights {
    /// Heaviest `n` terms of `topic`; equal weights order by term id.
    pub fn top_terms(&self, topic: usize, n: usize) -> Vec<(usize, f64)> {
        let Some(row) = self.topics.get(topic) else {
            return Vec::new();
        };
        let mut ranked: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Any probabilistic topic model producing per-topic term weights.
pub trait TopicModel {
    fn fit(&self, corpus: &Corpus) -> Result<TopicWeights>;
}

/// Collapsed Gibbs sampling LDA with symmetric priors `alpha = eta = 1/K`.
#[derive(Debug, Clone)]
pub struct GibbsLda {
    pub num_topics: usize,
    pub passes: usize,
    pub seed: u64,
}

impl GibbsLda {
    pub fn new(num_topics: usize, passes: usize, seed: u64) -> Self {
        Self {
            num_topics,
            passes,
            seed,
        }
    }
}

impl TopicModel for GibbsLda {
    fn fit(&self, corpus: &Corpus) -> Result<TopicWeights> {
        let k = self.num_topics;
        let v = corpus.num_terms;
        if k == 0 {
            return Err(Error::InvalidArgument("topic count must be at least 1".into()));
        }
        if v == 0 {
            return Err(Error::InvalidArgument("cannot fit a topic model on an empty vocabulary".into()));
        }
        let alpha = 1.0 / k as f64;
        let eta = 1.0 / k as f64;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut word_topic = vec![vec![0usize; k]; v];
        let mut doc_topic = vec![vec![0usize; k]; corpus.docs.len()];
        let mut topic_totals = vec![0usize; k];

        // One entry per token occurrence: (doc, word, topic).
        let mut assignments: Vec<(usize, usize, usize)> = Vec::new();
        for (d, bow) in corpus.docs.iter().enumerate() {
            for &(w, count) in bow {
                for _ in 0..count {
                    let z = rng.gen_range(0..k);
                    word_topic[w][z] += 1;
                    doc_topic[d][z] += 1;
                    topic_totals[z] += 1;
                    assignments.push((d, w, z));
                }
            }
        }

        let mut probs = vec![0.0; k];
        for pass in 0..self.passes {
            for slot in assignments.iter_mut() {
                let (d, w, old) = *slot;
                word_topic[w][old] -= 1;
                doc_topic[d][old] -= 1;
                topic_totals[old] -= 1;

                let mut total = 0.0;
                for (z, p) in probs.iter_mut().enumerate() {
                    *p = (doc_topic[d][z] as f64 + alpha) * (word_topic[w][z] as f64 + eta)
                        / (topic_totals[z] as f64 + v as f64 * eta);
                    total += *p;
                }
                let mut target = rng.gen::<f64>() * total;
                let mut new = k - 1;
                for (z, p) in probs.iter().enumerate() {
                    if target < *p {
                        new = z;
                        break;
                    }
                    target -= p;
                }

                word_topic[w][new] += 1;
                doc_topic[d][new] += 1;
                topic_totals[new] += 1;
                slot.2 = new;
            }
            debug!(pass, tokens = assignments.len(), "Gibbs pass done");
        }

        let topics = (0..k)
            .map(|z| {
                let denom = topic_totals[z] as f64 + v as f64 * eta;
                (0..v)
                    .map(|w| (word_topic[w][z] as f64 + eta) / denom)
                    .collect()
            })
            .collect();
        Ok(TopicWeights { topics })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    pub event: usize,
    /// Mean weight of the top keywords; lower reads as more exam-like.
    pub confidence: f64,
    pub keywords: Vec<(String, f64)>,
}

pub struct TopicScorer<M = GibbsLda> {
    normalizer: TextNormalizer,
    model: M,
    no_below: f64,
    no_above: f64,
    keywords: usize,
}

impl TopicScorer<GibbsLda> {
    /// Single-topic scorer for one event; the sampler seed is offset by the event id.
    pub fn for_event(cfg: &Config, event: usize) -> Self {
        Self::new(GibbsLda::new(1, cfg.topic_passes, cfg.topic_seed.wrapping_add(event as u64)))
            .with_filter(cfg.dict_no_below, cfg.dict_no_above)
            .with_keywords(cfg.topic_keywords)
    }
}

impl<M: TopicModel> TopicScorer<M> {
    pub fn new(model: M) -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            model,
            no_below: 0.2,
            no_above: 0.75,
            keywords: 10,
        }
    }

    pub fn with_filter(mut self, no_below: f64, no_above: f64) -> Self {
        self.no_below = no_below;
        self.no_above = no_above;
        self
    }

    pub fn with_keywords(mut self, keywords: usize) -> Self {
        self.keywords = keywords.max(1);
        self
    }

    /// Fails with `DegenerateCorpus` when no term survives the frequency filter.
    pub fn score(&self, event: usize, documents: &[String]) -> Result<TopicSummary> {
        let _timer = TOPIC_FIT_DURATION.start_timer();

        let texts: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.normalizer.normalize(doc).iter().collect())
            .collect();
        let mut dictionary = Dictionary::from_documents(&texts);
        dictionary.filter_extremes(self.no_below, self.no_above);
        if dictionary.is_empty() {
            return Err(Error::DegenerateCorpus {
                event,
                documents: documents.len(),
            });
        }

        let corpus = Corpus::new(&dictionary, &texts);
        let weights = self.model.fit(&corpus)?;
        let top = weights.top_terms(0, self.keywords);

        let confidence = top.iter().map(|(_, w)| w).sum::<f64>() / top.len() as f64;
        let keywords: Vec<(String, f64)> = top
            .into_iter()
            .filter_map(|(id, w)| dictionary.term(id).map(|t| (t.to_string(), w)))
            .collect();

        info!(
            event,
            documents = documents.len(),
            vocabulary = dictionary.len(),
            confidence,
            "Scored event topics"
        );
        Ok(TopicSummary {
            event,
            confidence,
            keywords,
        })
    }
}
