use citecheck::config::SplitterConfig;
use citecheck::splitter::CitationSplitter;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn splitter() -> CitationSplitter {
    CitationSplitter::new(SplitterConfig {
        cross_reference_max_words: 8,
        narrative_min_chars: 200,
        narrative_min_sentences: 3,
        normalize_unicode: true,
    })
}

fn bench_delimited(c: &mut Criterion) {
    let s = splitter();
    let footnote = "See Smith v. Jones, 1 F.3d 1, 5 (1st Cir. 1990) (holding that the rule applies); \
         see also Doe v. Roe, 2 F.3d 2 (2d Cir. 1991) (quoting \u{201C}the; settled; standard\u{201D}); \
         cf. O\u{2019}Neal v. Sideshow, 1 F.Supp.3d 1, 2 (C.D. Cal. 2022); \
         but see E v. F, 3 U.S. 3 (1992); see supra note 12.";

    c.bench_function("split_delimited_footnote", |b| {
        b.iter(|| s.split_text(black_box(footnote)))
    });
}

fn bench_narrative(c: &mut Criterion) {
    let s = splitter();
    let footnote = "The circuits have long disagreed about the proper standard of review. \
         The disagreement deepened over the past decade as more panels weighed in on the question. \
         See Smith v. Jones, 1 F.3d 1 (1st Cir. 1990), for the classic statement of the older rule. \
         Doe v. Roe, 2 F.3d 2 (2d Cir. 1991) took the opposite view and was widely followed. \
         Id. at 12. The dispute remains live today.";

    c.bench_function("split_narrative_footnote", |b| {
        b.iter(|| s.split_text(black_box(footnote)))
    });
}

criterion_group!(benches, bench_delimited, bench_narrative);
criterion_main!(benches);
