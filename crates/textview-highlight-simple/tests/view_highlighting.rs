use pretty_assertions::assert_eq;
use textview_core::{
    LanguageRegistry, TextBuffer, TextPosition, TextView, TokenKind,
};
use textview_highlight_simple::SimpleLexers;

fn view_for(text: &str, language: &str) -> (textview_core::SharedBuffer, TextView) {
    let buffer = TextBuffer::shared(text);
    let registry = LanguageRegistry::builtin();
    buffer
        .borrow_mut()
        .set_language(registry.by_name(language).cloned());
    let mut view = TextView::with_defaults(&buffer);
    view.resize(800.0, 400.0);
    view.set_lexer_provider(Box::new(SimpleLexers::new()));
    (buffer, view)
}

fn run_kinds(view: &TextView, ln: usize) -> Vec<TokenKind> {
    view.layout()
        .line(ln)
        .map(|line| line.markup.iter().map(|run| run.kind).collect())
        .unwrap_or_default()
}

#[test]
fn test_markdown_links_reach_the_layout_cache() {
    let (_buffer, mut view) = view_for("# Title\nsee [here](#L1C2) and https://example.com", "markdown");
    let line = view.layout().line(1).unwrap();
    let targets: Vec<&str> = line.links.iter().map(|l| l.target.as_str()).collect();
    assert_eq!(targets, vec!["#L1C2", "https://example.com"]);
    assert!(run_kinds(&view, 0).contains(&TokenKind::Heading));

    view.set_cursor(TextPosition::new(1, 5));
    assert!(view.activate_link_at_cursor());
    assert_eq!(view.cursor_pos(), TextPosition::new(0, 2));
}

#[test]
fn test_block_comment_state_survives_incremental_edit() {
    let (buffer, mut view) = view_for("int a; /* open\nint b;\n*/ int c;", "c");
    assert_eq!(run_kinds(&view, 1), vec![TokenKind::Comment]);

    view.set_cursor(TextPosition::new(2, 9));
    view.insert_at_cursor("x");
    assert_eq!(buffer.borrow().line(2), "*/ int c;x");
    assert_eq!(run_kinds(&view, 1), vec![TokenKind::Comment]);
}

#[test]
fn test_language_change_rehighlights() {
    let (buffer, mut view) = view_for("fn main() {}", "rust");
    assert!(run_kinds(&view, 0).contains(&TokenKind::Keyword));

    buffer.borrow_mut().set_language(None);
    view.sync();
    assert!(run_kinds(&view, 0).is_empty());
}
