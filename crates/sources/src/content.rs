//! Content Source - TF-IDF cosine similarity between movie tags
//!
//! "Movies that read like this one"
//!
//! ## Algorithm
//! 1. Vectorize every tag with [`TfidfVectorizer`]
//! 2. Build an inverted index term -> (item, weight)
//! 3. For each item (in parallel), accumulate dot products with every item
//!    sharing a term; rows are unit length so the dot product is the cosine
//! 4. Pin the diagonal to 1.0 and mirror the upper triangle
//! 5. At query time, rank the query's row descending (ties by item index)

use crate::error::{ModelError, Result};
use crate::types::{Recommendation, Score};
use crate::vectorizer::{TfidfMatrix, TfidfVectorizer};
use data_loader::{Catalog, ItemIndex};
use ndarray::Array2;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Fitted TF-IDF vectors plus the dense pairwise similarity matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityIndex {
    tfidf: TfidfMatrix,
    similarity: Array2<f32>,
}

impl SimilarityIndex {
    /// Vectorize `tags` and compute all pairwise cosine similarities
    pub fn fit(tags: &[&str], vectorizer: &TfidfVectorizer) -> Result<Self> {
        let tfidf = vectorizer.fit_transform(tags)?;
        let similarity = cosine_similarity_matrix(&tfidf)?;
        info!("Similarity matrix: {:?}", similarity.dim());
        Ok(Self { tfidf, similarity })
    }

    /// Reassemble from persisted parts, checking shapes and the diagonal
    pub fn from_parts(tfidf: TfidfMatrix, similarity: Array2<f32>) -> Result<Self> {
        tfidf.validate()?;

        let (rows, cols) = similarity.dim();
        if rows != cols {
            return Err(ModelError::DimensionMismatch {
                what: "similarity matrix columns".to_string(),
                expected: rows,
                found: cols,
            });
        }
        if rows != tfidf.n_docs() {
            return Err(ModelError::DimensionMismatch {
                what: "similarity matrix rows".to_string(),
                expected: tfidf.n_docs(),
                found: rows,
            });
        }
        if let Some(item) = (0..rows).find(|&i| similarity[[i, i]] != 1.0) {
            return Err(ModelError::InvalidModel(format!(
                "similarity diagonal at item {} is not 1",
                item
            )));
        }

        Ok(Self { tfidf, similarity })
    }

    pub fn into_parts(self) -> (TfidfMatrix, Array2<f32>) {
        (self.tfidf, self.similarity)
    }

    pub fn tfidf(&self) -> &TfidfMatrix {
        &self.tfidf
    }

    pub fn similarity(&self) -> &Array2<f32> {
        &self.similarity
    }

    pub fn len(&self) -> usize {
        self.similarity.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `n` other items ranked by similarity to `item`
    pub fn neighbors(&self, item: ItemIndex, n: usize) -> Vec<(ItemIndex, f32)> {
        if item >= self.len() {
            return Vec::new();
        }

        let mut scored: Vec<(ItemIndex, f32)> = self
            .similarity
            .row(item)
            .iter()
            .enumerate()
            .filter(|&(other, _)| other != item)
            .map(|(other, &sim)| (other, sim))
            .collect();

        scored.sort_by(|a, b| rank_descending(a.1, b.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(n);
        scored
    }
}

/// Descending by score; NaN sorts last
pub(crate) fn rank_descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}

/// Dense cosine similarity of L2-normalized sparse rows
pub fn cosine_similarity_matrix(tfidf: &TfidfMatrix) -> Result<Array2<f32>> {
    let n = tfidf.n_docs();
    if n == 0 {
        return Err(ModelError::EmptyInput("no item vectors".to_string()));
    }

    // term -> [(item, weight)], items ascending
    let mut postings: Vec<Vec<(u32, f32)>> = vec![Vec::new(); tfidf.n_terms()];
    for (item, row) in tfidf.rows().iter().enumerate() {
        for &(term, weight) in row {
            postings[term as usize].push((item as u32, weight));
        }
    }

    let mut data = vec![0.0f32; n * n];
    data.par_chunks_mut(n)
        .zip(tfidf.rows().par_iter())
        .enumerate()
        .for_each(|(item, (out, row))| {
            // Terms are visited in ascending order for every pair, so
            // (i, j) and (j, i) sum identical products in identical order
            for &(term, weight) in row {
                for &(other, other_weight) in &postings[term as usize] {
                    out[other as usize] += weight * other_weight;
                }
            }
            for value in out.iter_mut() {
                *value = value.clamp(-1.0, 1.0);
            }
            out[item] = 1.0;
        });

    let mut similarity = Array2::from_shape_vec((n, n), data)
        .map_err(|e| ModelError::InvalidModel(e.to_string()))?;

    for i in 0..n {
        for j in (i + 1)..n {
            similarity[[j, i]] = similarity[[i, j]];
        }
    }

    debug!("Computed {} pairwise similarities", n * n);
    Ok(similarity)
}

/// Content-based recommender over a shared catalog and similarity index
#[derive(Debug, Clone)]
pub struct ContentRecommender {
    catalog: Arc<Catalog>,
    index: Arc<SimilarityIndex>,
}

impl ContentRecommender {
    pub fn new(catalog: Arc<Catalog>, index: Arc<SimilarityIndex>) -> Result<Self> {
        if catalog.len() != index.len() {
            return Err(ModelError::DimensionMismatch {
                what: "similarity matrix rows".to_string(),
                expected: catalog.len(),
                found: index.len(),
            });
        }
        Ok(Self { catalog, index })
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// Up to `n` movies most similar to `title`; unknown title gives `[]`
    #[instrument(skip(self))]
    pub fn recommend(&self, title: &str, n: usize) -> Vec<Recommendation> {
        let Some(item) = self.catalog.index_of_title(title) else {
            debug!("Title not in catalog");
            return Vec::new();
        };

        let recommendations: Vec<Recommendation> = self
            .index
            .neighbors(item, n)
            .into_iter()
            .filter_map(|(other, sim)| match self.catalog.get(other) {
                Some(movie) => Some(Recommendation::from_movie(movie, Score::Content(sim))),
                None => {
                    warn!("Similarity row references missing item {}", other);
                    None
                }
            })
            .collect();

        debug!("Generated {} content recommendations", recommendations.len());
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{synthesize_tag, Movie};

    fn movie(id: u32, title: &str, overview: &str) -> Movie {
        let mut movie = Movie {
            id,
            title: title.to_string(),
            overview: overview.to_string(),
            genres: vec!["Drama".to_string()],
            keywords: vec![],
            cast: vec![],
            directors: vec![],
            vote_average: 6.0,
            vote_count: 100,
            popularity: 10.0,
            release_date: None,
            tag: String::new(),
        };
        movie.tag = synthesize_tag(&movie);
        movie
    }

    fn create_test_recommender() -> ContentRecommender {
        let catalog = Catalog::from_movies(vec![
            movie(1, "A", "space pirates treasure galaxy"),
            movie(2, "B", "space pirates treasure ocean"),
            movie(3, "C", "galaxy empire rebels war"),
            movie(4, "D", "kitchen chef cooking ocean"),
        ]);
        let tags: Vec<&str> = catalog.tags().collect();
        let index = SimilarityIndex::fit(&tags, &TfidfVectorizer::new()).unwrap();
        ContentRecommender::new(Arc::new(catalog), Arc::new(index)).unwrap()
    }

    #[test]
    fn test_similarity_matrix_shape_and_symmetry() {
        let recommender = create_test_recommender();
        let sim = recommender.index().similarity();

        assert_eq!(sim.dim(), (4, 4));
        for i in 0..4 {
            assert_eq!(sim[[i, i]], 1.0);
            for j in 0..4 {
                assert_eq!(sim[[i, j]], sim[[j, i]]);
                assert!(sim[[i, j]] <= 1.0);
            }
        }
    }

    #[test]
    fn test_recommend_excludes_query() {
        let recommender = create_test_recommender();
        let recs = recommender.recommend("A", 10);

        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].title, "B");
        assert!(recs.iter().all(|r| r.title != "A"));
        for pair in recs.windows(2) {
            assert!(pair[0].similarity_score() >= pair[1].similarity_score());
        }
    }

    #[test]
    fn test_unknown_title_is_empty() {
        let recommender = create_test_recommender();
        assert!(recommender.recommend("Nope", 5).is_empty());
        assert!(recommender.recommend("A", 0).is_empty());
    }

    #[test]
    fn test_ties_ordered_by_index() {
        let recommender = create_test_recommender();
        let (tfidf, _) = recommender.index().clone().into_parts();

        let mut sim = Array2::<f32>::eye(4);
        for (j, value) in [(1, 0.5), (2, 0.5), (3, 0.7)] {
            sim[[0, j]] = value;
            sim[[j, 0]] = value;
        }
        let index = SimilarityIndex::from_parts(tfidf, sim).unwrap();

        assert_eq!(index.neighbors(0, 3), vec![(3, 0.7), (1, 0.5), (2, 0.5)]);
        assert_eq!(index.neighbors(0, 1), vec![(3, 0.7)]);
        assert!(index.neighbors(9, 3).is_empty());
    }

    #[test]
    fn test_from_parts_rejects_bad_shapes() {
        let recommender = create_test_recommender();
        let (tfidf, _) = recommender.index().clone().into_parts();

        let wrong = Array2::<f32>::eye(3);
        assert!(SimilarityIndex::from_parts(tfidf.clone(), wrong).is_err());

        let zeros = Array2::<f32>::zeros((4, 4));
        assert!(SimilarityIndex::from_parts(tfidf.clone(), zeros).is_err());

        assert!(SimilarityIndex::from_parts(tfidf, Array2::eye(4)).is_ok());
    }

    #[test]
    fn test_rank_descending_puts_nan_last() {
        let mut values = vec![0.2, f32::NAN, 0.9, 0.5];
        values.sort_by(|a, b| rank_descending(*a, *b));
        assert_eq!(&values[..3], &[0.9, 0.5, 0.2]);
        assert!(values[3].is_nan());
    }
}
