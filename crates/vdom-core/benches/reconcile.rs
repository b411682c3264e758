use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vdom_core::{diff_and_patch, h, materialize, Attributes, Child, Document, MemoryDocument};

const SECTION_COUNT: usize = 4;
const ROWS_PER_SECTION: usize = 32;
const LIST_LENGTH_SAMPLES: &[usize] = &[8, 16, 32, 64, 128];

fn page(sections: usize, rows_per_section: usize, tick: usize) -> Child {
    let sections = (0..sections).map(|section| {
        let rows = (0..rows_per_section).map(move |row| {
            h(
                "li",
                Attributes::new().attr("class", "row"),
                [
                    Child::from(h("span", None, [format!("Item {section}-{row}")])),
                    Child::from(h("em", None, [tick])),
                ],
            )
        });
        h(
            "section",
            Attributes::new().attr("id", format!("section-{section}")),
            [
                Child::from(h("h2", None, [format!("Section {section}")])),
                Child::from(h("ul", None, rows)),
            ],
        )
    });
    Child::from(h("main", None, sections))
}

fn list(len: usize) -> Child {
    Child::from(h(
        "ul",
        None,
        (0..len).map(|item| h("li", None, [format!("item {item}")])),
    ))
}

struct ReconcileFixture {
    document: MemoryDocument,
    current: Child,
}

impl ReconcileFixture {
    fn new(tree: Child) -> Self {
        let mut document = MemoryDocument::new();
        let body = document.root();
        let node = materialize(&mut document, &tree).expect("materialize");
        document.append_child(body, node).expect("attach");
        document.take_mutations();
        Self {
            document,
            current: tree,
        }
    }

    fn patch(&mut self, next: Child) {
        let body = self.document.root();
        diff_and_patch(&mut self.document, body, Some(&self.current), Some(&next), 0)
            .expect("diff");
        self.current = next;
        black_box(self.document.take_mutations());
    }
}

fn bench_materialize(c: &mut Criterion) {
    let tree = page(SECTION_COUNT, ROWS_PER_SECTION, 0);
    c.bench_function("reconcile_materialize", |b| {
        b.iter(|| {
            let mut document = MemoryDocument::new();
            let node = materialize(&mut document, &tree).expect("materialize");
            black_box(node);
        });
    });
}

fn bench_unchanged(c: &mut Criterion) {
    let mut fixture = ReconcileFixture::new(page(SECTION_COUNT, ROWS_PER_SECTION, 0));
    c.bench_function("reconcile_unchanged", |b| {
        b.iter(|| fixture.patch(page(SECTION_COUNT, ROWS_PER_SECTION, 0)));
    });
}

fn bench_text_updates(c: &mut Criterion) {
    let mut fixture = ReconcileFixture::new(page(SECTION_COUNT, ROWS_PER_SECTION, 0));
    let mut tick = 0;
    c.bench_function("reconcile_text_updates", |b| {
        b.iter(|| {
            tick += 1;
            fixture.patch(page(SECTION_COUNT, ROWS_PER_SECTION, tick));
        });
    });
}

fn bench_list_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_list_resize");
    for &len in LIST_LENGTH_SAMPLES {
        group.bench_with_input(BenchmarkId::new("items", len), &len, |b, &len| {
            let mut fixture = ReconcileFixture::new(list(len));
            b.iter(|| {
                fixture.patch(list(len / 2));
                fixture.patch(list(len));
            });
        });
    }
    group.finish();
}

criterion_group!(
    reconcile,
    bench_materialize,
    bench_unchanged,
    bench_text_updates,
    bench_list_resize
);
criterion_main!(reconcile);
