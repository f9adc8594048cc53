// Criterion benchmarks for Sentimatch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sentimatch::core::{select_top_matches, Lexicon, Matcher};
use sentimatch::models::{ConversationSet, Profile, ScoredPair};

const LINES: [&str; 8] = [
    "Hey! I love your hiking photos, they look amazing",
    "Thanks! That trail was so beautiful, you would love it",
    "Honestly I'm not a huge fan of crowded trails though",
    "Same, the quiet ones are the best",
    "Do you like cooking? I make a pretty good curry",
    "That sounds delicious, I'd really enjoy trying it",
    "Haha deal, you bring dessert",
    "Perfect, it's a date!",
];

fn create_profile(id: u32) -> Profile {
    Profile {
        id,
        name: format!("User{}", id),
        age: 20 + (id % 20) as u8,
        bio: "Fitness enthusiast".to_string(),
        interests: vec!["Hiking".to_string(), "Cooking".to_string()],
        personality: "Cheerful optimist".to_string(),
        prompt_answers: vec![],
    }
}

fn create_conversation(a: &Profile, b: &Profile, offset: usize) -> Vec<String> {
    (0..LINES.len())
        .map(|i| {
            let speaker = if i % 2 == 0 { &a.name } else { &b.name };
            format!("{}: {}", speaker, LINES[(i + offset) % LINES.len()])
        })
        .collect()
}

fn create_session(count: u32) -> (Vec<Profile>, ConversationSet) {
    let profiles: Vec<Profile> = (0..count).map(create_profile).collect();
    let mut conversations = ConversationSet::new();

    for (i, a) in profiles.iter().enumerate() {
        for b in &profiles[i + 1..] {
            conversations.insert(a.id, b.id, create_conversation(a, b, i));
        }
    }

    (profiles, conversations)
}

fn bench_lexicon_score(c: &mut Criterion) {
    let lexicon = Lexicon::embedded().expect("embedded lexicon");

    c.bench_function("lexicon_score", |b| {
        b.iter(|| lexicon.score(black_box(LINES[1])));
    });
}

fn bench_score_conversation(c: &mut Criterion) {
    let matcher = Matcher::with_defaults();
    let (profiles, _) = create_session(2);
    let conversation = create_conversation(&profiles[0], &profiles[1], 0);

    c.bench_function("score_conversation", |b| {
        b.iter(|| matcher.score_conversation(black_box(&conversation)));
    });
}

fn bench_full_run(c: &mut Criterion) {
    let matcher = Matcher::with_defaults();
    let mut group = c.benchmark_group("analysis_run");

    for profile_count in [5u32, 10, 25, 50].iter() {
        let (profiles, conversations) = create_session(*profile_count);

        group.bench_with_input(
            BenchmarkId::from_parameter(profile_count),
            &(profiles, conversations),
            |b, (profiles, conversations)| {
                b.iter(|| matcher.run(black_box(profiles), black_box(conversations)));
            },
        );
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_top_matches");

    for profile_count in [10u32, 50, 200].iter() {
        let profiles: Vec<Profile> = (0..*profile_count).map(create_profile).collect();
        let mut pairs = Vec::new();
        for a in 0..*profile_count {
            for b in (a + 1)..*profile_count {
                pairs.push(ScoredPair {
                    user_a_id: a,
                    user_b_id: b,
                    user_a_name: format!("User{}", a),
                    user_b_name: format!("User{}", b),
                    sentiment_score: ((a * 31 + b * 17) % 100) as f64 / 100.0,
                    conversation: vec![],
                    error: None,
                });
            }
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(profile_count),
            &(profiles, pairs),
            |b, (profiles, pairs)| {
                b.iter(|| select_top_matches(black_box(profiles), black_box(pairs), 3));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lexicon_score,
    bench_score_conversation,
    bench_full_run,
    bench_selection
);
criterion_main!(benches);
