use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use textview_core::{KeyEvent, TextBuffer, TextPosition, TextView};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog (textview benchmark line)\n"
        ));
    }
    // Drop the final '\n' so there is no trailing empty line.
    out.pop();
    out
}

fn bench_large_file_open(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("large_file_open/50k_lines", |b| {
        b.iter(|| {
            let buffer = TextBuffer::shared(black_box(&text));
            let mut view = TextView::with_defaults(&buffer);
            view.resize(640.0, 480.0);
            black_box(view.layout().total_size());
        })
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("typing_middle/100_keys", |b| {
        b.iter_batched(
            || {
                let buffer = TextBuffer::shared(&text);
                let mut view = TextView::with_defaults(&buffer);
                view.resize(640.0, 480.0);
                view.set_cursor(TextPosition::new(25_000, 10));
                (buffer, view)
            },
            |(buffer, mut view)| {
                for _ in 0..100 {
                    view.handle_key(&KeyEvent::char('x'));
                }
                black_box(buffer.borrow().version());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_foreign_edit_sync(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("foreign_edit_sync/100_edits", |b| {
        b.iter_batched(
            || {
                let buffer = TextBuffer::shared(&text);
                let mut view = TextView::with_defaults(&buffer);
                view.resize(640.0, 480.0);
                (buffer, view)
            },
            |(buffer, mut view)| {
                for i in 0..100 {
                    buffer
                        .borrow_mut()
                        .insert_text(TextPosition::new(10_000 + i, 0), "new line\n");
                    view.sync();
                }
                black_box(view.layout().line_count());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_isearch(c: &mut Criterion) {
    let text = large_text(50_000);
    let buffer = TextBuffer::shared(&text);
    let mut view = TextView::with_defaults(&buffer);
    view.resize(640.0, 480.0);

    c.bench_function("isearch/type_and_cancel", |b| {
        b.iter(|| {
            view.isearch_trigger();
            for ch in "lazy dog".chars() {
                view.isearch_key(ch);
            }
            black_box(view.isearch().matches().len());
            view.escape();
        })
    });
}

criterion_group!(
    benches,
    bench_large_file_open,
    bench_typing_in_middle,
    bench_foreign_edit_sync,
    bench_isearch
);
criterion_main!(benches);
