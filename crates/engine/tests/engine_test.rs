//! Integration tests for the recommendation engine.
//!
//! These tests build real engines over small in-memory catalogs and check
//! the query contracts end to end.

use data_loader::{synthesize_tag, Catalog, Movie};
use engine::{EngineConfig, RecommendationEngine};
use std::collections::HashSet;

const WORDS: &[&str] = &[
    "space", "pirates", "treasure", "galaxy", "ocean", "empire", "rebels", "kitchen", "chef",
    "detective", "murder", "island", "robot", "dragon", "castle", "heist",
];

fn movie(id: u32, title: &str, overview: &str) -> Movie {
    let mut movie = Movie {
        id,
        title: title.to_string(),
        overview: overview.to_string(),
        genres: vec![],
        keywords: vec![],
        cast: vec![],
        directors: vec![],
        vote_average: 6.5,
        vote_count: 100,
        popularity: 30.0,
        release_date: None,
        tag: String::new(),
    };
    movie.tag = synthesize_tag(&movie);
    movie
}

/// Five movies whose pairwise similarities are easy to work out by hand
fn create_toy_catalog() -> Catalog {
    Catalog::from_movies(vec![
        movie(1, "A", "space pirates treasure galaxy"),
        movie(2, "B", "space pirates treasure ocean"),
        movie(3, "C", "galaxy empire rebels war"),
        movie(4, "D", "kitchen chef cooking ocean"),
        movie(5, "E", "kitchen chef cooking empire"),
    ])
}

fn create_test_catalog(size: usize) -> Catalog {
    let movies = (0..size)
        .map(|i| {
            let overview = (0..4)
                .map(|k| WORDS[(i * 3 + k * 5) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ");
            let mut m = movie(1000 + i as u32, &format!("Movie {}", i), &overview);
            m.genres = vec![["Action", "Drama", "Comedy"][i % 3].to_string()];
            m.directors = vec![format!("Director {}", i % 5)];
            m.vote_average = (i % 10) as f32;
            m.popularity = (i * 2) as f32;
            m.tag = synthesize_tag(&m);
            m
        })
        .collect();
    Catalog::from_movies(movies)
}

fn create_test_engine() -> RecommendationEngine {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let config = EngineConfig::default().with_user_count(60).with_rank(8);
    RecommendationEngine::from_catalog(create_test_catalog(80), &config).unwrap()
}

#[test]
fn test_toy_catalog_content_ordering() {
    let config = EngineConfig::default().with_user_count(20);
    let engine = RecommendationEngine::from_catalog(create_toy_catalog(), &config).unwrap();

    let recs = engine.content_recommend("A", 2);
    let titles: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["B", "C"]);

    let sim_b = recs[0].similarity_score().unwrap();
    let sim_c = recs[1].similarity_score().unwrap();
    assert!((sim_b - 5.0 / 6.0).abs() < 1e-5);
    assert!((sim_c - 1.0 / 12f32.sqrt()).abs() < 1e-5);
}

#[test]
fn test_toy_catalog_every_user_fully_rated() {
    let config = EngineConfig::default().with_user_count(20);
    let engine = RecommendationEngine::from_catalog(create_toy_catalog(), &config).unwrap();

    // Five movies, at least ten ratings per user
    assert!(engine.collaborative_recommend(0, 5).is_empty());
    assert!(engine.collaborative_recommend(19, 5).is_empty());

    // Only the content side contributes
    let recs = engine.hybrid_recommend(Some("A"), Some(0), 3);
    assert_eq!(recs.len(), 3);
    assert!(recs.iter().all(|r| r.similarity_score().is_some()));
}

#[test]
fn test_unknown_inputs_are_empty() {
    let engine = create_test_engine();
    assert!(engine.content_recommend("No Such Movie", 10).is_empty());
    assert!(engine.collaborative_recommend(60, 10).is_empty());
    assert!(engine.hybrid_recommend(None, None, 10).is_empty());
    assert!(engine.hybrid_recommend(Some("No Such Movie"), Some(60), 10).is_empty());
}

#[test]
fn test_similarity_matrix_properties() {
    let engine = create_test_engine();
    let sim = engine.similarity_index().similarity();
    let n = engine.catalog().len();

    assert_eq!(sim.dim(), (n, n));
    for i in 0..n {
        assert_eq!(sim[[i, i]], 1.0);
        for j in 0..n {
            assert_eq!(sim[[i, j]], sim[[j, i]]);
            assert!((-1.0..=1.0).contains(&sim[[i, j]]));
        }
    }
}

#[test]
fn test_same_seed_same_engine() {
    let config = EngineConfig::default().with_user_count(60).with_rank(8);
    let a = RecommendationEngine::from_catalog(create_test_catalog(40), &config).unwrap();
    let b = RecommendationEngine::from_catalog(create_test_catalog(40), &config).unwrap();

    assert_eq!(a.interactions(), b.interactions());
    assert_eq!(a.similarity_index(), b.similarity_index());
    assert_eq!(a.model(), b.model());

    let other = RecommendationEngine::from_catalog(
        create_test_catalog(40),
        &config.clone().with_seed(7),
    )
    .unwrap();
    assert_ne!(a.interactions(), other.interactions());
}

#[test]
fn test_content_results_contract() {
    let engine = create_test_engine();

    for title in ["Movie 0", "Movie 17", "Movie 79"] {
        for n in [1, 5, 20] {
            let recs = engine.content_recommend(title, n);
            assert_eq!(recs.len(), n);
            assert!(recs.iter().all(|r| r.title != title));
            for pair in recs.windows(2) {
                assert!(pair[0].similarity_score() >= pair[1].similarity_score());
            }
        }
    }
}

#[test]
fn test_collaborative_excludes_rated_movies() {
    let engine = create_test_engine();

    for user in 0..60 {
        let recs = engine.collaborative_recommend(user, 15);
        assert_eq!(recs.len(), 15);

        let row = engine.interactions().user_row(user).unwrap();
        for rec in &recs {
            let idx = engine.catalog().index_of_title(&rec.title).unwrap();
            assert_eq!(row[idx], 0);
        }
        for pair in recs.windows(2) {
            assert!(pair[0].predicted_rating() >= pair[1].predicted_rating());
        }
    }
}

#[test]
fn test_hybrid_unique_sorted_and_sized() {
    let engine = create_test_engine();

    for (title, user) in [("Movie 3", 2), ("Movie 40", 11), ("Movie 66", 59)] {
        for n in [1, 6, 25] {
            let content = engine.content_recommend(title, n);
            let collab = engine.collaborative_recommend(user, n);
            let unique: HashSet<&str> = content
                .iter()
                .chain(collab.iter())
                .map(|r| r.title.as_str())
                .collect();

            let recs = engine.hybrid_recommend(Some(title), Some(user), n);
            assert_eq!(recs.len(), n.min(unique.len()));

            let titles: HashSet<&str> = recs.iter().map(|r| r.title.as_str()).collect();
            assert_eq!(titles.len(), recs.len());

            for pair in recs.windows(2) {
                assert!(pair[0].combined_score >= pair[1].combined_score);
            }
        }
    }
}

#[test]
fn test_hybrid_keeps_movie_with_empty_title() {
    let mut movies = create_test_catalog(80).into_movies();
    movies[1].title = String::new();
    let config = EngineConfig::default().with_user_count(60).with_rank(8);
    let engine = RecommendationEngine::from_catalog(Catalog::from_movies(movies), &config).unwrap();

    let content = engine.content_recommend("Movie 7", 100);
    let collab = engine.collaborative_recommend(0, 100);
    assert!(content.iter().any(|r| r.title.is_empty()));
    assert!(!collab.is_empty());
    let unique: HashSet<&str> = content
        .iter()
        .chain(collab.iter())
        .map(|r| r.title.as_str())
        .collect();

    let recs = engine.hybrid_recommend(Some("Movie 7"), Some(0), 100);
    assert_eq!(recs.len(), 100.min(unique.len()));
    assert_eq!(recs.iter().filter(|r| r.title.is_empty()).count(), 1);
}

#[test]
fn test_records_carry_catalog_fields() {
    let engine = create_test_engine();
    let recs = engine.content_recommend("Movie 5", 3);

    for rec in &recs {
        let movie = engine.find_movie(&rec.title).unwrap();
        assert_eq!(rec.movie_id, movie.id);
        assert_eq!(rec.vote_average, movie.vote_average);
        assert!(rec.genres.len() <= 3);
        assert!(rec.overview.chars().count() <= 103);
        assert!(rec.combined_score.is_none());
    }
}
