use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gitshell::git::{parse_numstat, BranchCollection};
use gitshell::{Branch, Commit, Repository, RepositoryOptions, ScriptedShell};
use std::sync::Arc;

const BRANCH_LIST: &str = "* main
  feature-x
  bugfix-123
  experiment
  release-v1.0
  remotes/origin/HEAD -> origin/main
  remotes/origin/main
  remotes/origin/feature-x";

fn generate_branch_list(num_branches: usize) -> String {
    let mut output = String::from("* main\n");
    for i in 0..num_branches {
        output.push_str(&format!("  feature/topic-{}\n", i));
        output.push_str(&format!("  remotes/origin/feature/topic-{}\n", i));
    }
    output
}

fn generate_log(num_commits: usize) -> Vec<String> {
    (0..num_commits)
        .map(|i| format!("{:07x} {} dev{}@example.com", i, 1_600_000_000 + i, i % 7))
        .collect()
}

fn generate_numstat(num_files: usize) -> String {
    let mut output = String::new();
    for i in 0..num_files {
        if i % 10 == 0 {
            output.push_str(&format!("-\t-\tassets/image_{}.png\n", i));
        } else {
            output.push_str(&format!("{}\t{}\tsrc/module_{}.rs\n", i % 50, i % 13, i));
        }
    }
    output
}

fn scripted_repo(shell: ScriptedShell) -> Repository {
    Repository::open(".", RepositoryOptions::with_shell(Arc::new(shell)))
        .unwrap_or_else(|e| panic!("cannot open bench repository: {e}"))
}

fn bench_branch_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("branch_listing");

    let small = scripted_repo(ScriptedShell::new().reply("git branch -a", BRANCH_LIST));
    group.bench_function(BenchmarkId::new("small", "8 branches"), |b| {
        b.iter(|| BranchCollection::load(black_box(&small)))
    });

    let large_listing = generate_branch_list(500);
    let large = scripted_repo(ScriptedShell::new().reply("git branch -a", &large_listing));
    group.bench_function(BenchmarkId::new("large", "1001 branches"), |b| {
        b.iter(|| BranchCollection::load(black_box(&large)))
    });

    group.bench_function("single_remote_line", |b| {
        b.iter(|| Branch::parse(&small, black_box("  remotes/origin/release/1.0")))
    });

    group.finish();
}

fn bench_commit_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_parse");
    let repo = scripted_repo(ScriptedShell::new());

    for size in [10, 1000] {
        let lines = generate_log(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &lines, |b, lines| {
            b.iter(|| {
                lines
                    .iter()
                    .map(|line| Commit::parse(&repo, black_box(line)))
                    .collect::<Result<Vec<_>, _>>()
            })
        });
    }

    group.finish();
}

fn bench_parse_numstat(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_numstat");

    for size in [10, 100, 1000] {
        let output = generate_numstat(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &output, |b, output| {
            b.iter(|| parse_numstat("main...topic", black_box(output)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_branch_listing, bench_commit_parse, bench_parse_numstat);
criterion_main!(benches);
