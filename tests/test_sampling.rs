use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stochmap::alignment::{Alignment, DataType, SitePatterns};
use stochmap::ancestry::{AncestralSampler, SamplingError, clade_leaves};
use stochmap::likelihood::{EngineSettings, LikelihoodEngine, PruningLikelihood, SiteModel, SubstitutionModel};
use stochmap::model::{LeafLabelMap, TaxonSet, Tree};
use stochmap::newick::parse_str_with_taxa;

const TREE: &str = "((A:0.1,B:0.1)C:0.2,((D:0.1,E:0.1)F:0.1,G:0.2)H:0.1);";

struct Fixture {
    tree: Tree,
    labels: LeafLabelMap,
    patterns: SitePatterns,
}

impl Fixture {
    fn new(tree: &str, sequences: &[(&str, &str)], exclusion: Option<std::ops::Range<usize>>) -> Self {
        let alignment = Alignment::from_sequences(DataType::Nucleotide, sequences.iter().copied()).unwrap();
        let (tree, labels) = parse_str_with_taxa(tree, alignment.taxa().clone()).unwrap();
        let patterns = SitePatterns::with_exclusion(&alignment, exclusion).unwrap();
        Self { tree, labels, patterns }
    }

    fn birds() -> Self {
        Self::new(
            TREE,
            &[
                ("A", "ACGTACGTAA"),
                ("B", "ACGTACGTAC"),
                ("D", "ACGTNRGTAA"),
                ("E", "ACGAACGTAA"),
                ("G", "TCGAACGTAA"),
            ],
            None,
        )
    }

    fn engine(&self, settings: EngineSettings, site_model: SiteModel) -> PruningLikelihood<'_> {
        let mut engine = PruningLikelihood::new(
            &self.tree,
            &self.labels,
            &self.patterns,
            SubstitutionModel::equal_frequencies(4).unwrap(),
            site_model,
            settings,
        )
        .unwrap();
        engine.recompute_all().unwrap();
        engine
    }

    fn vertex(&self, label: &str) -> usize {
        self.tree.find_vertex(label, &self.labels).unwrap()
    }
}

#[test]
fn test_vector_covers_uncompressed_sites() {
    let fixture = Fixture::birds();
    assert!(fixture.patterns.pattern_count() < fixture.patterns.site_count());
    let engine = fixture.engine(EngineSettings::new(), SiteModel::single());
    let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(17));

    for label in ["C", "F", "H", "G"] {
        let states = sampler.sample(&fixture.tree, &engine, fixture.vertex(label)).unwrap();
        assert_eq!(states.len(), 10);
    }
}

#[test]
fn test_observed_leaf_states_are_copied() {
    let fixture = Fixture::birds();
    let engine = fixture.engine(EngineSettings::new(), SiteModel::single());
    let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(2));

    let d = sampler.sample(&fixture.tree, &engine, fixture.vertex("D")).unwrap();
    // ACGTNRGTAA
    assert_eq!(
        d,
        &[Some(0), Some(1), Some(2), Some(3), None, None, Some(2), Some(3), Some(0), Some(0)]
    );
}

#[test]
fn test_ambiguous_leaf_states_are_sampled_when_enabled() {
    let fixture = Fixture::birds();
    let engine = fixture.engine(EngineSettings::new().with_ambiguities(true), SiteModel::single());

    for seed in 0..20 {
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(seed));
        let d = sampler.sample(&fixture.tree, &engine, fixture.vertex("D")).unwrap();
        assert!(d.iter().all(Option::is_some));
        // R = {A, G}
        assert!(matches!(d[5], Some(0) | Some(2)));
        assert_eq!(d[1], Some(1));
    }
}

#[test]
fn test_short_branches_pin_mrca_to_leaves() {
    let fixture = Fixture::new(
        "((A:1e-9,B:1e-9):1e-9,C:1e-9);",
        &[("A", "ACGTTGCA"), ("B", "ACGTTGCA"), ("C", "ACGTTGCA")],
        None,
    );
    let engine = fixture.engine(EngineSettings::new(), SiteModel::single());
    let leaves = clade_leaves(&fixture.tree, &fixture.labels, &TaxonSet::new("ab", ["A", "B"]));

    for seed in 0..10 {
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(seed));
        let states = sampler
            .sample_clade_states(&fixture.tree, &engine, &leaves, false)
            .unwrap();
        assert_eq!(
            states,
            vec![Some(0), Some(1), Some(2), Some(3), Some(3), Some(2), Some(1), Some(0)]
        );
    }
}

#[test]
fn test_same_seed_reproduces_passes() {
    let fixture = Fixture::birds();
    let engine = fixture.engine(EngineSettings::new(), SiteModel::single());
    let leaves = clade_leaves(&fixture.tree, &fixture.labels, &TaxonSet::new("deg", ["D", "E", "G"]));

    let passes = |seed: u64| -> Vec<Vec<Option<usize>>> {
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(seed));
        (0..5)
            .map(|_| {
                sampler.begin_pass();
                sampler
                    .sample_clade_states(&fixture.tree, &engine, &leaves, true)
                    .unwrap()
            })
            .collect()
    };
    assert_eq!(passes(99), passes(99));
}

#[test]
fn test_clade_shares_states_with_its_parent_in_a_pass() {
    let fixture = Fixture::birds();
    let engine = fixture.engine(EngineSettings::new(), SiteModel::single());
    let de = clade_leaves(&fixture.tree, &fixture.labels, &TaxonSet::new("de", ["D", "E"]));
    let deg = clade_leaves(&fixture.tree, &fixture.labels, &TaxonSet::new("deg", ["E", "G", "D"]));
    let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(5));

    let parent_of_de = sampler.sample_clade_states(&fixture.tree, &engine, &de, true).unwrap();
    let mrca_of_deg = sampler.sample_clade_states(&fixture.tree, &engine, &deg, false).unwrap();
    assert_eq!(parent_of_de, mrca_of_deg);
}

#[test]
fn test_excluded_sites_are_still_sampled() {
    let fixture = Fixture::new(
        "((A:0.1,B:0.1):0.1,C:0.1);",
        &[("A", "AAAAACGT"), ("B", "CCCCCCGT"), ("C", "GGGGGCGA")],
        Some(0..4),
    );
    assert_eq!(fixture.patterns.excluded_patterns().len(), 1);
    assert_eq!(fixture.patterns.pattern_count(), 5);
    let engine = fixture.engine(EngineSettings::new(), SiteModel::single());
    let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(8));
    let root = sampler.sample(&fixture.tree, &engine, fixture.tree.root_index()).unwrap();
    assert_eq!(root.len(), 8);
    assert!(root.iter().all(Option::is_some));
}

#[test]
fn test_rate_categories_are_unsupported() {
    let fixture = Fixture::birds();
    let engine = fixture.engine(EngineSettings::new(), SiteModel::with_rates(vec![0.5, 1.5]).unwrap());
    let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(0));
    let result = sampler.sample(&fixture.tree, &engine, fixture.vertex("F"));
    assert!(matches!(result, Err(SamplingError::Unsupported(_))));
}
