use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vibe_ide::assistant::parse_explanations;
use vibe_ide::workspace::{build_tree, LocalDirectory, MemoryDirectory};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build")
}

fn synthetic_folder(dirs: usize, files_per_dir: usize) -> MemoryDirectory {
    let mut root = MemoryDirectory::new("project");
    for d in (0..dirs).rev() {
        let mut dir = MemoryDirectory::new(format!("feature_{d:03}"));
        for f in (0..files_per_dir).rev() {
            dir = dir.with_file(format!("File_{f:04}.rs"), format!("pub fn f{f}() {{}}\n"));
        }
        root = root.with_dir(dir);
    }
    root.with_file("README.md", "# project\n")
}

fn bench_build_tree_memory(c: &mut Criterion) {
    let rt = runtime();
    let folder = synthetic_folder(100, 40);

    c.bench_function("build_tree_memory_4000", |b| {
        b.iter(|| {
            let snapshot = rt
                .block_on(build_tree(black_box(&folder)))
                .expect("tree should build");
            black_box(snapshot.file_contents.len());
        });
    });
}

fn bench_build_tree_local(c: &mut Criterion) {
    let rt = runtime();
    let temp = tempfile::tempdir().expect("tempdir");
    for d in 0..20 {
        let dir = temp.path().join(format!("module_{d:02}"));
        std::fs::create_dir_all(&dir).expect("create dir");
        for f in 0..25 {
            std::fs::write(dir.join(format!("file_{f:03}.ts")), "export const x = 1;\n")
                .expect("write synthetic source");
        }
    }
    let root = rt
        .block_on(LocalDirectory::open(temp.path()))
        .expect("open tempdir");

    c.bench_function("build_tree_local_500", |b| {
        b.iter(|| {
            let snapshot = rt.block_on(build_tree(&root)).expect("tree should build");
            black_box(snapshot.children.len());
        });
    });
}

fn bench_parse_explanations(c: &mut Criterion) {
    let entries: Vec<String> = (0..200)
        .map(|i| {
            format!(
                r#"{{"functionName":"handler_{i}","explanation":"Handles request {i}."}}"#
            )
        })
        .collect();
    let raw = format!("```json\n[{}]\n```", entries.join(","));

    c.bench_function("parse_explanations_200", |b| {
        b.iter(|| {
            let parsed = parse_explanations(black_box(&raw)).expect("valid reply");
            black_box(parsed.len());
        });
    });
}

criterion_group!(
    perf_core,
    bench_build_tree_memory,
    bench_build_tree_local,
    bench_parse_explanations
);
criterion_main!(perf_core);
