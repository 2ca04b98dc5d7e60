//! Citation formatting integration tests

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use quill_core::citations::{
    BibliographyStyle, CitationFormatter, CitationMode, CitationPlaceholder, StyleClass,
    StyleRegistry,
};
use quill_core::quill_domain::StoreHandle;
use quill_core::config::CitationConfig;
use quill_core::sync::{BibSyncClient, ServerBibItem};

use common::fakes::{full_list, server_error, server_item, styles, MockService, ScriptedFactory};

fn store_with(items: Vec<ServerBibItem>) -> StoreHandle {
    let store = StoreHandle::for_owner(1);
    store.upsert(items.into_iter().map(|item| {
        let entry = item.into_entry().unwrap();
        (entry.id, entry)
    }));
    store
}

fn darwin_and_wallace() -> StoreHandle {
    store_with(vec![
        server_item(1, "darwin1859", "Darwin", 1859),
        server_item(2, "wallace1858", "Wallace", 1858),
    ])
}

fn formatter(factory: &Arc<ScriptedFactory>) -> CitationFormatter {
    CitationFormatter::new(styles(), factory.clone())
}

fn texts(output: &quill_core::FormattedOutput) -> Vec<&str> {
    output
        .citations
        .iter()
        .map(|c| c.display_text.as_str())
        .collect()
}

#[tokio::test]
async fn test_one_citation_per_placeholder_in_order() {
    let factory = ScriptedFactory::new();
    let placeholders = vec![
        CitationPlaceholder::new(["2"]),
        CitationPlaceholder::new(["1", "2"]).with_locator(0, "5"),
        CitationPlaceholder::new(["1"]),
    ];

    let output = formatter(&factory)
        .format(&placeholders, "author-date", &darwin_and_wallace(), None)
        .await;

    assert_eq!(
        texts(&output),
        vec!["(Wallace 1858)", "(Darwin 1859, p. 5; Wallace 1858)", "(Darwin 1859)"]
    );
    let notes: Vec<_> = output.citations.iter().map(|c| c.note_index).collect();
    assert_eq!(notes, vec![1, 2, 3]);
    assert_eq!(output.citation_class, Some(StyleClass::InText));
    assert!(output.is_complete());
}

#[tokio::test]
async fn test_missing_entries_keep_citation_count() {
    let factory = ScriptedFactory::new();
    let placeholders = vec![
        CitationPlaceholder::new(["1"]),
        CitationPlaceholder::new(["404"]),
        CitationPlaceholder::new(["2", "405", "404"]),
    ];

    let output = formatter(&factory)
        .format(&placeholders, "author-date", &darwin_and_wallace(), None)
        .await;

    assert_eq!(output.citations.len(), 3);
    assert_eq!(texts(&output)[1], "([404?])");
    assert_eq!(output.unresolved, vec!["404", "405"]);
    assert_eq!(output.reloads, 0);
}

#[tokio::test]
async fn test_empty_locators_and_prefixes_are_omitted() {
    let factory = ScriptedFactory::new();
    let placeholders = vec![CitationPlaceholder::from_node_attrs(
        "1,2",
        ",,,12",
        "see,,,",
        "autocite",
    )];

    formatter(&factory)
        .format(&placeholders, "author-date", &darwin_and_wallace(), None)
        .await;

    let clusters = factory.clusters.lock().unwrap();
    let items = &clusters[0].items;
    assert_eq!(items[0].locator, None);
    assert_eq!(items[0].prefix.as_deref(), Some("see"));
    assert_eq!(items[1].locator.as_deref(), Some("12"));
    assert_eq!(items[1].prefix, None);
    assert_eq!(clusters[0].note_index, 1);
}

// === textcite ===

#[tokio::test]
async fn test_textcite_splits_author_and_date() {
    let factory = ScriptedFactory::new();
    let placeholders = vec![
        CitationPlaceholder::new(["1", "2"])
            .with_locator(0, "5")
            .with_mode(CitationMode::Textcite),
        CitationPlaceholder::new(["2"]),
    ];

    let output = formatter(&factory)
        .format(&placeholders, "author-date", &darwin_and_wallace(), None)
        .await;

    assert_eq!(
        texts(&output),
        vec!["Darwin (1859, p. 5); Wallace (1858)", "(Wallace 1858)"]
    );
}

#[tokio::test]
async fn test_textcite_is_ignored_for_note_styles() {
    let factory = ScriptedFactory::new();
    let placeholders = vec![CitationPlaceholder::new(["1"]).with_mode(CitationMode::Textcite)];

    let output = formatter(&factory)
        .format(&placeholders, "footnotes", &darwin_and_wallace(), None)
        .await;

    assert_eq!(texts(&output), vec!["1. Darwin 1859"]);
    assert_eq!(output.citation_class, Some(StyleClass::Note));
}

#[tokio::test]
async fn test_revised_textcite_keeps_author_date_split() {
    let factory = ScriptedFactory::revising();
    let placeholders = vec![
        CitationPlaceholder::new(["1"]).with_mode(CitationMode::Textcite),
        CitationPlaceholder::new(["2"]),
    ];

    let output = formatter(&factory)
        .format(&placeholders, "author-date", &darwin_and_wallace(), None)
        .await;

    assert_eq!(texts(&output), vec!["Darwin (1859)", "(Wallace 1858)"]);
}

#[tokio::test]
async fn test_revisions_replace_earlier_parenthetical_citations() {
    let factory = ScriptedFactory::revising();
    let placeholders = vec![CitationPlaceholder::new(["1"]), CitationPlaceholder::new(["2"])];

    let output = formatter(&factory)
        .format(&placeholders, "author-date", &darwin_and_wallace(), None)
        .await;

    assert_eq!(texts(&output), vec!["(Darwin 1859a)", "(Wallace 1858)"]);
}

// === styles ===

#[tokio::test]
async fn test_unknown_style_formats_like_first_style() {
    let placeholders = vec![
        CitationPlaceholder::new(["1"]),
        CitationPlaceholder::new(["2", "1"]),
    ];
    let store = darwin_and_wallace();

    let fallback_factory = ScriptedFactory::new();
    let fallback = formatter(&fallback_factory)
        .format(&placeholders, "no-such-style", &store, None)
        .await;
    let first_factory = ScriptedFactory::new();
    let first = formatter(&first_factory)
        .format(&placeholders, "author-date", &store, None)
        .await;

    assert_eq!(fallback, first);
    assert_eq!(fallback_factory.built_styles(), vec!["author-date"]);
}

#[tokio::test]
async fn test_configured_default_style_applies_when_none_is_named() {
    let factory = ScriptedFactory::new();
    let config = CitationConfig {
        default_style: Some("footnotes".to_string()),
        ..CitationConfig::default()
    };
    let formatter = CitationFormatter::from_config(styles(), factory.clone(), &config);

    let output = formatter
        .format(&[CitationPlaceholder::new(["1"])], "", &darwin_and_wallace(), None)
        .await;
    formatter
        .format(&[CitationPlaceholder::new(["1"])], "numeric", &darwin_and_wallace(), None)
        .await;

    assert_eq!(output.citation_class, Some(StyleClass::Note));
    assert_eq!(factory.built_styles(), vec!["footnotes", "numeric"]);
}

#[tokio::test]
async fn test_numbering_follows_document_order() {
    let factory = ScriptedFactory::new();
    let placeholders = vec![
        CitationPlaceholder::new(["2"]),
        CitationPlaceholder::new(["1"]),
        CitationPlaceholder::new(["2"]),
    ];

    let output = formatter(&factory)
        .format(&placeholders, "numeric", &darwin_and_wallace(), None)
        .await;

    assert_eq!(texts(&output), vec!["[1]", "[2]", "[1]"]);
}

#[tokio::test]
async fn test_empty_registry_yields_empty_citations() {
    let factory = ScriptedFactory::new();
    let formatter = CitationFormatter::new(StyleRegistry::new(), factory.clone());
    let placeholders = vec![CitationPlaceholder::new(["1"]), CitationPlaceholder::new(["2"])];

    let output = formatter
        .format(&placeholders, "author-date", &darwin_and_wallace(), None)
        .await;

    assert_eq!(texts(&output), vec!["", ""]);
    assert_eq!(output.citations[1].note_index, 2);
    assert_eq!(output.citation_class, None);
    assert!(factory.built_styles().is_empty());
}

// === bibliography ===

#[tokio::test]
async fn test_bibliography_html_and_css() {
    let factory = ScriptedFactory::with_bibliography_style(BibliographyStyle {
        entry_spacing: 0.0,
        line_spacing: 1.0,
        hanging_indent: Some(1.5),
        second_field_align: Some("flush".to_string()),
        ..BibliographyStyle::default()
    });
    let placeholders = vec![CitationPlaceholder::new(["2", "1"])];

    let output = formatter(&factory)
        .format(&placeholders, "author-date", &darwin_and_wallace(), None)
        .await;

    assert_eq!(
        output.bibliography_html(),
        "<h1 class=\"article-bibliography-header\"></h1><div class=\"csl-bib-body\">\
         <div class=\"csl-entry\">Wallace 1858</div>\
         <div class=\"csl-entry\">Darwin 1859</div></div>"
    );
    assert!(output
        .bibliography_css()
        .contains(".csl-right-inline {text-indent:-1.5em; margin-left:1.5em;}"));
}

// === missing-entry reload ===

fn reload_client(service: &Arc<MockService>, store: &StoreHandle) -> BibSyncClient {
    BibSyncClient::new(service.clone(), store.clone())
}

#[tokio::test]
async fn test_reload_resolves_missing_entry_and_restarts() {
    let service = MockService::new();
    service.push_list(Ok(full_list(
        vec![
            server_item(1, "darwin1859", "Darwin", 1859),
            server_item(3, "mendel1866", "Mendel", 1866),
        ],
        vec![],
    )));
    let store = store_with(vec![server_item(1, "darwin1859", "Darwin", 1859)]);
    let client = reload_client(&service, &store);
    let factory = ScriptedFactory::new();
    let placeholders = vec![CitationPlaceholder::new(["1"]), CitationPlaceholder::new(["3"])];

    let output = formatter(&factory)
        .format(&placeholders, "author-date", &store, Some(&client))
        .await;

    assert_eq!(service.list_calls(), 1);
    assert_eq!(output.reloads, 1);
    assert_eq!(texts(&output), vec!["(Darwin 1859)", "(Mendel 1866)"]);
    assert!(output.is_complete());
    assert_eq!(factory.built_styles().len(), 2);
}

#[tokio::test]
async fn test_reload_with_single_recent_sync_proceeds() {
    let service = MockService::new();
    let store = darwin_and_wallace();
    store.record_sync(Utc::now());
    let client = reload_client(&service, &store);
    let placeholders = vec![CitationPlaceholder::new(["9"])];

    let output = formatter(&ScriptedFactory::new())
        .format(&placeholders, "author-date", &store, Some(&client))
        .await;

    assert_eq!(service.list_calls(), 1);
    assert_eq!(output.reloads, 0);
    assert_eq!(output.unresolved, vec!["9"]);
}

#[tokio::test]
async fn test_reload_is_throttled_within_window() {
    let service = MockService::new();
    let store = darwin_and_wallace();
    let now = Utc::now();
    store.record_sync(now - Duration::seconds(20));
    store.record_sync(now - Duration::seconds(5));
    let client = reload_client(&service, &store);
    let placeholders = vec![CitationPlaceholder::new(["1"]), CitationPlaceholder::new(["9"])];

    let output = formatter(&ScriptedFactory::new())
        .format(&placeholders, "author-date", &store, Some(&client))
        .await;

    assert_eq!(service.list_calls(), 0);
    assert_eq!(output.citations.len(), 2);
    assert_eq!(output.unresolved, vec!["9"]);
}

#[tokio::test]
async fn test_reload_proceeds_after_window() {
    let service = MockService::new();
    let store = darwin_and_wallace();
    let now = Utc::now();
    store.record_sync(now - Duration::seconds(90));
    store.record_sync(now - Duration::seconds(31));
    let client = reload_client(&service, &store);

    formatter(&ScriptedFactory::new())
        .format(&[CitationPlaceholder::new(["9"])], "author-date", &store, Some(&client))
        .await;

    assert_eq!(service.list_calls(), 1);
}

#[tokio::test]
async fn test_configured_window_is_respected() {
    let service = MockService::new();
    let store = darwin_and_wallace();
    let now = Utc::now();
    store.record_sync(now - Duration::seconds(90));
    store.record_sync(now - Duration::seconds(31));
    let client = reload_client(&service, &store);
    let formatter = formatter(&ScriptedFactory::new()).with_reload_window(Duration::minutes(5));

    formatter
        .format(&[CitationPlaceholder::new(["9"])], "author-date", &store, Some(&client))
        .await;

    assert_eq!(service.list_calls(), 0);
}

#[tokio::test]
async fn test_failed_reload_completes_with_partial_results() {
    let service = MockService::new();
    service.push_list(Err(server_error(502, "Bad gateway")));
    let store = darwin_and_wallace();
    let client = reload_client(&service, &store);
    let placeholders = vec![CitationPlaceholder::new(["1"]), CitationPlaceholder::new(["9"])];

    let output = formatter(&ScriptedFactory::new())
        .format(&placeholders, "author-date", &store, Some(&client))
        .await;

    assert_eq!(service.list_calls(), 1);
    assert_eq!(texts(&output), vec!["(Darwin 1859)", "([9?])"]);
    assert_eq!(output.unresolved, vec!["9"]);
}

#[tokio::test]
async fn test_repeated_misses_stop_at_throttle() {
    let service = MockService::new();
    let store = darwin_and_wallace();
    let client = reload_client(&service, &store);
    let formatter = formatter(&ScriptedFactory::new());
    let placeholders = vec![CitationPlaceholder::new(["9"])];

    for _ in 0..4 {
        formatter
            .format(&placeholders, "author-date", &store, Some(&client))
            .await;
    }

    assert_eq!(service.list_calls(), 2);
}
