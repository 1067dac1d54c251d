#![cfg(test)]

use crate::assets::{AssetLoader, AssetState};
use crate::config::LayoutConfig;
use crate::engine::{Layout, RenderedPage};
use crate::metrics::FlowMetrics;
use crate::overflow::has_overflow;
use crate::test_utils::{build_source, el, el_with, init_logger, metrics, nth, para, text, text_node};
use crate::token::{BreakToken, BreakTokens};
use crate::{LayoutError, OverflowContentError};
use futures::future::LocalBoxFuture;
use quire_dom::{SourceTree, classes};
use quire_types::PageBounds;
use std::cell::RefCell;
use std::rc::Rc;

fn layout(bounds: PageBounds) -> Layout<FlowMetrics> {
    Layout::new(metrics(&bounds), bounds, LayoutConfig::default())
}

async fn paginate(layout: &mut Layout<FlowMetrics>, source: &SourceTree) -> Vec<RenderedPage> {
    let mut pages: Vec<RenderedPage> = Vec::new();
    let mut token: Option<BreakTokens> = None;
    loop {
        let page = layout.render_page(source, token.as_ref()).await.unwrap();
        token = page.break_token.clone();
        pages.push(page);
        if token.is_none() {
            return pages;
        }
        assert!(pages.len() < 50, "pagination does not terminate");
    }
}

fn page_texts(pages: &[RenderedPage]) -> Vec<String> {
    pages.iter().map(|p| p.fragment.text()).collect()
}

#[tokio::test]
async fn test_long_word_breaks_at_the_right_edge() {
    init_logger();
    let word = "Supercalifragilisticexpialidocious";
    let source = build_source(vec![text(word)]);
    let t = text_node(&source, word);
    let mut layout = layout(PageBounds::sized(100.0, 20.0));

    let first = layout.render_page(&source, None).await.unwrap();
    assert_eq!(first.break_token, Some(BreakTokens::One(BreakToken::new(t, 10))));
    assert_eq!(first.fragment.text(), "Supercalif\u{2011}");
    let root = first.fragment.root();
    assert!(first.fragment.has_class(root, classes::HYPHEN));

    let second = layout
        .render_page(&source, first.break_token.as_ref())
        .await
        .unwrap();
    assert!(second.fragment.text().starts_with("ragilistic"));
    assert_eq!(second.break_token, Some(BreakTokens::One(BreakToken::new(t, 20))));
}

#[tokio::test]
async fn test_pages_concatenate_to_the_source_text() {
    let word = "Supercalifragilisticexpialidocious";
    let source = build_source(vec![text(word)]);
    let mut layout = layout(PageBounds::sized(100.0, 20.0));

    let pages = paginate(&mut layout, &source).await;
    assert_eq!(
        page_texts(&pages),
        vec!["Supercalif\u{2011}", "ragilistic\u{2011}", "expialidoc\u{2011}", "ious"]
    );
    let joined: String = page_texts(&pages).concat().replace('\u{2011}', "");
    assert_eq!(joined, word);
}

#[tokio::test]
async fn test_hyphenation_can_be_disabled() {
    let word = "Supercalifragilisticexpialidocious";
    let source = build_source(vec![text(word)]);
    let bounds = PageBounds::sized(100.0, 20.0);
    let config = LayoutConfig {
        hyphenate: false,
        ..LayoutConfig::default()
    };
    let mut layout = Layout::new(metrics(&bounds), bounds, config);

    let page = layout.render_page(&source, None).await.unwrap();
    assert_eq!(page.fragment.text(), "Supercalif");
}

fn six_paragraphs() -> SourceTree {
    build_source(vec![
        para("one"),
        para("two"),
        para("three"),
        para("four"),
        para("five"),
        para("six"),
    ])
}

#[tokio::test]
async fn test_blocks_fill_pages_in_order() {
    let source = six_paragraphs();
    let bounds = PageBounds::sized(100.0, 30.0);
    let mut layout = layout(bounds);

    let pages = paginate(&mut layout, &source).await;
    assert_eq!(page_texts(&pages), vec!["onetwothree", "fourfivesix"]);
    assert_eq!(
        pages[0].break_token,
        Some(BreakTokens::One(BreakToken::at(nth(&source, "p", 3))))
    );
    assert!(pages[1].is_last());
    for page in &pages {
        assert!(!has_overflow(layout.oracle(), &page.fragment, &bounds));
    }
}

#[tokio::test]
async fn test_small_max_chars_measures_more_often_with_same_result() {
    let source = six_paragraphs();
    let bounds = PageBounds::sized(100.0, 30.0);
    let config = LayoutConfig {
        max_chars: 3,
        ..LayoutConfig::default()
    };
    let mut layout = Layout::new(metrics(&bounds), bounds, config);

    let pages = paginate(&mut layout, &source).await;
    assert_eq!(page_texts(&pages), vec!["onetwothree", "fourfivesix"]);
}

#[tokio::test]
async fn test_following_page_never_repeats_content() {
    let source = build_source(vec![
        para("alpha beta gamma delta"),
        para("epsilon zeta eta theta"),
        para("iota kappa lambda mu"),
    ]);
    let mut layout = layout(PageBounds::sized(100.0, 30.0));

    let pages = paginate(&mut layout, &source).await;
    assert!(pages.len() > 1);
    let joined: String = page_texts(&pages).concat();
    assert_eq!(joined, source.text_content(source.root()));
}

#[tokio::test]
async fn test_layout_node_hook_forces_break_before_node() {
    let source = build_source(vec![para("a"), el("h2", vec![text("b")]), para("c")]);
    let h2 = nth(&source, "h2", 0);
    let mut layout = layout(PageBounds::sized(100.0, 100.0));
    layout.hooks_mut().on_layout_node("chapters", |source, node, control| {
        if source.has_tag(node, "h2") {
            control.force_break();
        }
    });

    let pages = paginate(&mut layout, &source).await;
    assert_eq!(pages[0].break_token, Some(BreakTokens::One(BreakToken::at(h2))));
    assert_eq!(page_texts(&pages), vec!["a", "bc"]);
}

#[tokio::test]
async fn test_break_directives_start_new_pages() {
    let source = build_source(vec![
        para("a"),
        el_with("p", &[("data-break-before", "page")], vec![text("b")]),
        el_with("p", &[("data-break-after", "right")], vec![text("c")]),
        para("d"),
        el_with("p", &[("data-break-before", "avoid")], vec![text("e")]),
    ]);
    let mut layout = layout(PageBounds::sized(100.0, 100.0));

    let pages = paginate(&mut layout, &source).await;
    assert_eq!(page_texts(&pages), vec!["a", "bc", "de"]);
}

#[tokio::test]
async fn test_named_page_change_breaks_and_marks_page() {
    let source = build_source(vec![
        para("a"),
        el_with("section", &[("data-page", "chapter")], vec![para("b")]),
    ]);
    let mut layout = layout(PageBounds::sized(100.0, 100.0));

    let pages = paginate(&mut layout, &source).await;
    assert_eq!(page_texts(&pages), vec!["a", "b"]);
    assert_eq!(pages[0].fragment.named_page(), None);
    assert_eq!(pages[1].fragment.named_page(), Some("chapter"));
    let classes = pages[1].fragment.page_classes();
    assert!(classes.iter().any(|c| c == "quire-chapter-page"));
    assert!(classes.iter().any(|c| c == "quire-chapter-first-page"));
}

#[tokio::test]
async fn test_oversized_block_is_kept_and_layout_moves_on() {
    let source = build_source(vec![
        el_with("img", &[("width", "10"), ("height", "50")], vec![]),
        para("after"),
    ]);
    let mut layout = layout(PageBounds::sized(100.0, 30.0));

    let first = layout.render_page(&source, None).await.unwrap();
    let img = nth(&source, "img", 0);
    assert!(first.fragment.lookup(img).is_some());
    assert!(first.fragment.lookup(nth(&source, "p", 0)).is_none());
    assert_eq!(
        first.break_token,
        Some(BreakTokens::One(BreakToken::at(nth(&source, "p", 0))))
    );

    let second = layout
        .render_page(&source, first.break_token.as_ref())
        .await
        .unwrap();
    assert_eq!(second.fragment.text(), "after");
    assert!(second.is_last());
}

#[tokio::test]
async fn test_unplaceable_last_node_is_an_error() {
    let source = build_source(vec![el_with("img", &[("width", "10"), ("height", "50")], vec![])]);
    let img = nth(&source, "img", 0);
    let mut layout = layout(PageBounds::sized(100.0, 30.0));
    let results = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&results);
    layout
        .hooks_mut()
        .before_render_result("seen", move |token, _| seen.borrow_mut().push(token.cloned()));

    let err = layout.render_page(&source, None).await.unwrap_err();
    match err {
        LayoutError::OverflowContent(OverflowContentError { nodes }) => assert_eq!(nodes, vec![img]),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(*results.borrow(), vec![None]);
}

#[tokio::test]
async fn test_empty_source_renders_empty_last_page() {
    let source = build_source(vec![]);
    let mut layout = layout(PageBounds::sized(100.0, 30.0));

    let page = layout.render_page(&source, None).await.unwrap();
    assert!(page.is_last());
    assert!(page.fragment.is_blank());
}

fn two_column_table() -> SourceTree {
    build_source(vec![el(
        "table",
        vec![el(
            "tr",
            vec![
                el("td", vec![text("aa bb cc dd ee")]),
                el("td", vec![text("ff gg hh ii jj")]),
            ],
        )],
    )])
}

#[tokio::test]
async fn test_table_columns_resume_independently() {
    let source = two_column_table();
    let a = text_node(&source, "aa bb cc dd ee");
    let f = text_node(&source, "ff gg hh ii jj");
    let mut layout = layout(PageBounds::sized(100.0, 20.0));

    let first = layout.render_page(&source, None).await.unwrap();
    assert_eq!(
        first.break_token.as_ref().map(|t| t.as_slice().to_vec()),
        Some(vec![BreakToken::new(a, 12), BreakToken::new(f, 12)])
    );
    assert_eq!(first.fragment.text(), "aa bb cc dd ff gg hh ii ");

    let second = layout
        .render_page(&source, first.break_token.as_ref())
        .await
        .unwrap();
    assert!(second.is_last());
    assert_eq!(second.fragment.text(), "eejj");
    let table = second.fragment.lookup(nth(&source, "table", 0)).unwrap();
    assert!(second.fragment.attr(table, quire_dom::attrs::SPLIT_FROM).is_some());
}

#[tokio::test]
async fn test_hooks_observe_the_page_pass() {
    let source = six_paragraphs();
    let mut layout = layout(PageBounds::sized(100.0, 30.0));
    let rendered = Rc::new(RefCell::new(0));
    let removed = Rc::new(RefCell::new(String::new()));
    let results = Rc::new(RefCell::new(Vec::new()));

    let count = Rc::clone(&rendered);
    let moved = Rc::clone(&removed);
    let seen = Rc::clone(&results);
    layout
        .hooks_mut()
        .on_render_node("count", move |_, _, _| *count.borrow_mut() += 1)
        .after_overflow_removed("moved", move |extracted, page| {
            for e in extracted {
                moved.borrow_mut().push_str(&e.text_content(page));
            }
        })
        .before_render_result("seen", move |token, _| seen.borrow_mut().push(token.cloned()));

    let page = layout.render_page(&source, None).await.unwrap();
    assert_eq!(*rendered.borrow(), 6);
    assert_eq!(*removed.borrow(), "fourfivesix");
    assert_eq!(*results.borrow(), vec![page.break_token.clone()]);
}

#[tokio::test]
async fn test_overflow_hook_can_cancel_the_break() {
    let source = six_paragraphs();
    let mut layout = layout(PageBounds::sized(100.0, 30.0));
    layout.hooks_mut().on_overflow("keep-all", |_, _| Some(None));

    let page = layout.render_page(&source, None).await.unwrap();
    assert!(page.is_last());
    assert_eq!(page.fragment.text(), "onetwothreefourfivesix");
}

struct Pending {
    requested: Rc<RefCell<Vec<String>>>,
}

impl AssetLoader for Pending {
    fn ready(&self, src: &str) -> LocalBoxFuture<'_, AssetState> {
        self.requested.borrow_mut().push(src.to_string());
        Box::pin(async {
            tokio::task::yield_now().await;
            AssetState::Loaded
        })
    }
}

#[tokio::test]
async fn test_images_are_awaited_before_measuring() {
    let source = build_source(vec![
        para("a"),
        el_with("img", &[("src", "figure.png"), ("width", "10"), ("height", "10")], vec![]),
    ]);
    let requested = Rc::new(RefCell::new(Vec::new()));
    let bounds = PageBounds::sized(100.0, 100.0);
    let mut layout = Layout::new(metrics(&bounds), bounds, LayoutConfig::default()).with_assets(Pending {
        requested: Rc::clone(&requested),
    });

    let page = layout.render_page(&source, None).await.unwrap();
    assert!(page.is_last());
    assert_eq!(*requested.borrow(), vec!["figure.png"]);
}
