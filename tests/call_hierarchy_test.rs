mod common;

use common::{FixtureWorkspace, position_of, span_between, span_of, span_of_nth};
use symgraph::{
    CallDirection, EdgeRelation, FsDocuments, HierarchyItem, HierarchyProvider, LineIndex,
    MemoryDocuments, OutlineNode, Position, Range, SymbolKind,
};
use tokio_util::sync::CancellationToken;

const MAIN_TS: &str = "\
function main() {
  callThreeTwice();
}
";

const TWO_TS: &str = "\
function callThreeTwice() {
  three().tada();
  three().tada();
}
";

const THREE_TS: &str = "\
class Three {
  tada() {
    return 'tada';
  }
}
function three() {
  return new Three();
}
";

fn full_span(text: &str) -> Range {
    Range::new(Position::new(0, 0), LineIndex::new(text).position_at(text.len()))
}

fn module(text: &str, children: Vec<OutlineNode>) -> OutlineNode {
    OutlineNode::new("<module>", SymbolKind::Module, vec![full_span(text)]).with_children(children)
}

fn workspace() -> FixtureWorkspace {
    let main_outline = module(
        MAIN_TS,
        vec![
            OutlineNode::new(
                "main",
                SymbolKind::Function,
                vec![span_between(MAIN_TS, "function main", "\n}")],
            )
            .with_name_span(span_of(MAIN_TS, "main")),
        ],
    );

    let two_outline = module(
        TWO_TS,
        vec![
            OutlineNode::new(
                "callThreeTwice",
                SymbolKind::Function,
                vec![span_between(TWO_TS, "function callThreeTwice", "\n}")],
            )
            .with_name_span(span_of(TWO_TS, "callThreeTwice")),
        ],
    );

    let three_outline = module(
        THREE_TS,
        vec![
            OutlineNode::new(
                "Three",
                SymbolKind::Class,
                vec![span_between(THREE_TS, "class Three", "\n}")],
            )
            .with_name_span(span_of(THREE_TS, "Three"))
            .with_children(vec![
                OutlineNode::new(
                    "tada",
                    SymbolKind::Method,
                    vec![span_between(THREE_TS, "tada() {", "  }")],
                )
                .with_name_span(span_of(THREE_TS, "tada")),
            ]),
            OutlineNode::new(
                "three",
                SymbolKind::Function,
                vec![span_between(THREE_TS, "function three", "\n}")],
            )
            .with_name_span(span_of(THREE_TS, "three")),
        ],
    );

    FixtureWorkspace::new()
        .add("main.ts", MAIN_TS, main_outline)
        .add("two.ts", TWO_TS, two_outline)
        .add("three.ts", THREE_TS, three_outline)
}

/// Flatten an item's edge tree into `(uri, selection_range, call_site)`
/// keys for superset comparisons.
fn edge_keys(item: &HierarchyItem) -> Vec<(String, Range, Range)> {
    let mut out = Vec::new();
    let mut stack = vec![item];
    while let Some(current) = stack.pop() {
        for edge in current.edges.iter().flatten() {
            for site in &edge.call_sites {
                out.push((edge.item.uri.clone(), edge.item.selection_range, site.range));
            }
            stack.push(&edge.item);
        }
    }
    out
}

#[tokio::test]
async fn test_depth_zero_is_idempotent_and_unresolved() {
    let provider = workspace().provider();
    let cancel = CancellationToken::new();
    let position = position_of(THREE_TS, "tada");

    let first = provider
        .call_hierarchy("three.ts", position, CallDirection::Incoming, 0, &cancel)
        .await
        .unwrap();
    let second = provider
        .call_hierarchy("three.ts", position, CallDirection::Incoming, 0, &cancel)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.name, "tada");
    assert_eq!(first.kind, SymbolKind::Method);
    assert!(first.edges.is_none());

    // Unresolved items serialize without an edges key at all.
    let json = serde_json::to_value(&first).unwrap();
    assert!(json.get("edges").is_none());
}

#[tokio::test]
async fn test_incoming_two_call_sites_become_two_edges() {
    let provider = workspace().provider();
    let cancel = CancellationToken::new();

    let item = provider
        .call_hierarchy(
            "three.ts",
            position_of(THREE_TS, "tada"),
            CallDirection::Incoming,
            1,
            &cancel,
        )
        .await
        .unwrap();

    let edges = item.edges.as_ref().unwrap();
    assert_eq!(edges.len(), 2, "one edge per call site, never merged");

    for edge in edges {
        assert_eq!(edge.relation, EdgeRelation::Caller);
        assert_eq!(edge.item.name, "callThreeTwice");
        assert_eq!(edge.item.uri, "two.ts");
        assert_eq!(edge.call_sites.len(), 1);
        // Depth budget spent: callers are present but unresolved.
        assert!(edge.item.edges.is_none());
    }

    // Same target node, distinct call-site lines.
    assert!(edges[0].item.same_node(&edges[1].item));
    let lines: Vec<u32> = edges.iter().map(|e| e.call_sites[0].range.start.line).collect();
    assert_eq!(lines, vec![1, 2]);
}

#[tokio::test]
async fn test_incoming_depth_two_reaches_main() {
    let provider = workspace().provider();
    let cancel = CancellationToken::new();

    let item = provider
        .call_hierarchy(
            "three.ts",
            position_of(THREE_TS, "tada"),
            CallDirection::Incoming,
            2,
            &cancel,
        )
        .await
        .unwrap();

    let edges = item.edges.as_ref().unwrap();
    assert_eq!(edges.len(), 2);

    for edge in edges {
        let inner = edge.item.edges.as_ref().unwrap();
        assert_eq!(inner.len(), 1, "callThreeTwice has exactly one caller");
        assert_eq!(inner[0].item.name, "main");
        assert_eq!(inner[0].item.uri, "main.ts");
        assert_eq!(inner[0].call_sites[0].uri, "main.ts");
    }
}

#[tokio::test]
async fn test_depth_monotonicity() {
    let provider = workspace().provider();
    let cancel = CancellationToken::new();
    let position = position_of(THREE_TS, "tada");

    let mut previous: Vec<(String, Range, Range)> = Vec::new();
    for depth in 0..=3 {
        let item = provider
            .call_hierarchy("three.ts", position, CallDirection::Incoming, depth, &cancel)
            .await
            .unwrap();
        let keys = edge_keys(&item);
        for key in &previous {
            assert!(keys.contains(key), "depth {depth} lost a previously seen edge");
        }
        previous = keys;
    }
}

#[tokio::test]
async fn test_resolve_deepens_a_returned_item() {
    let provider = workspace().provider();
    let cancel = CancellationToken::new();

    let root = provider
        .call_hierarchy(
            "three.ts",
            position_of(THREE_TS, "tada"),
            CallDirection::Incoming,
            1,
            &cancel,
        )
        .await
        .unwrap();

    // Take one unresolved caller and deepen it without re-walking from the
    // original position.
    let caller = root.edges.as_ref().unwrap()[0].item.clone();
    assert!(caller.edges.is_none());

    let resolved = provider
        .resolve_call_item(caller.clone(), CallDirection::Incoming, 1, &cancel)
        .await;
    assert!(resolved.same_node(&caller));

    let edges = resolved.edges.as_ref().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].item.name, "main");
}

#[tokio::test]
async fn test_outgoing_calls_with_candidate_call_sites() {
    let provider = workspace().provider();
    let cancel = CancellationToken::new();

    let item = provider
        .call_hierarchy(
            "main.ts",
            position_of(MAIN_TS, "main"),
            CallDirection::Outgoing,
            1,
            &cancel,
        )
        .await
        .unwrap();

    let edges = item.edges.as_ref().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].relation, EdgeRelation::Callee);
    assert_eq!(edges[0].item.name, "callThreeTwice");
    assert_eq!(edges[0].item.uri, "two.ts");

    // The call site is the candidate's span in the caller, not the
    // definition's span in the callee.
    assert_eq!(edges[0].call_sites.len(), 1);
    assert_eq!(edges[0].call_sites[0].uri, "main.ts");
    assert_eq!(edges[0].call_sites[0].range, span_of(MAIN_TS, "callThreeTwice"));
}

#[tokio::test]
async fn test_outgoing_preserves_repeated_calls_as_separate_edges() {
    let provider = workspace().provider();
    let cancel = CancellationToken::new();

    let item = provider
        .call_hierarchy(
            "two.ts",
            position_of(TWO_TS, "callThreeTwice"),
            CallDirection::Outgoing,
            1,
            &cancel,
        )
        .await
        .unwrap();

    let edges = item.edges.as_ref().unwrap();
    let names: Vec<&str> = edges.iter().map(|e| e.item.name.as_str()).collect();
    assert_eq!(names, ["three", "tada", "three", "tada"]);

    // The two `tada` edges target the same node through different sites.
    let tada_sites: Vec<Range> = edges
        .iter()
        .filter(|e| e.item.name == "tada")
        .map(|e| e.call_sites[0].range)
        .collect();
    assert_eq!(tada_sites[0], span_of_nth(TWO_TS, "tada", 0));
    assert_eq!(tada_sites[1], span_of_nth(TWO_TS, "tada", 1));
}

#[tokio::test]
async fn test_incoming_never_produces_a_self_edge() {
    let text = "function looper() {\n  looper();\n  looper();\n}\n";
    let outline = module(
        text,
        vec![
            OutlineNode::new(
                "looper",
                SymbolKind::Function,
                vec![span_between(text, "function looper", "\n}")],
            )
            .with_name_span(span_of(text, "looper")),
        ],
    );

    let provider = FixtureWorkspace::new().add("rec.ts", text, outline).provider();
    let cancel = CancellationToken::new();

    let item = provider
        .call_hierarchy(
            "rec.ts",
            position_of(text, "looper"),
            CallDirection::Incoming,
            1,
            &cancel,
        )
        .await
        .unwrap();

    // Both recursive call sites resolve back to the root and are dropped.
    assert_eq!(item.edges, Some(Vec::new()));
}

#[tokio::test]
async fn test_root_outside_any_symbol_is_none() {
    let provider = workspace().provider();
    let cancel = CancellationToken::new();

    let missing = provider
        .call_hierarchy(
            "three.ts",
            Position::new(99, 0),
            CallDirection::Incoming,
            1,
            &cancel,
        )
        .await;
    assert!(missing.is_none());

    let unknown_file = provider
        .call_hierarchy("nope.ts", Position::new(0, 0), CallDirection::Incoming, 1, &cancel)
        .await;
    assert!(unknown_file.is_none());
}

#[tokio::test]
async fn test_cancelled_compute_returns_nothing() {
    let provider = workspace().provider();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let item = provider
        .call_hierarchy(
            "three.ts",
            position_of(THREE_TS, "tada"),
            CallDirection::Incoming,
            2,
            &cancel,
        )
        .await;
    assert!(item.is_none(), "a cancelled build never returns a partial tree");
}

#[tokio::test]
async fn test_cancelled_resolve_returns_input_unchanged() {
    let provider = workspace().provider();
    let cancel = CancellationToken::new();

    let root = provider
        .call_hierarchy(
            "three.ts",
            position_of(THREE_TS, "tada"),
            CallDirection::Incoming,
            0,
            &cancel,
        )
        .await
        .unwrap();

    cancel.cancel();
    let resolved = provider
        .resolve_call_item(root.clone(), CallDirection::Incoming, 2, &cancel)
        .await;
    assert_eq!(resolved, root);
}

/// An engine where every query fails, standing in for a crashed process.
struct DownEngine;

#[async_trait::async_trait]
impl symgraph::AnalysisEngine for DownEngine {
    async fn definition(
        &self,
        _uri: &str,
        _position: Position,
    ) -> symgraph::engine::EngineResult<Vec<symgraph::FileSpan>> {
        Err(symgraph::EngineError::ChannelClosed)
    }

    async fn references(
        &self,
        _uri: &str,
        _range: Range,
    ) -> symgraph::engine::EngineResult<Vec<symgraph::ReferenceEntry>> {
        Err(symgraph::EngineError::ChannelClosed)
    }

    async fn symbol_outline(
        &self,
        _uri: &str,
    ) -> symgraph::engine::EngineResult<Option<OutlineNode>> {
        Err(symgraph::EngineError::ChannelClosed)
    }
}

#[tokio::test]
async fn test_engine_failure_at_root_aborts_below_root_degrades() {
    let cancel = CancellationToken::new();

    // At the root: the whole request collapses to None.
    let provider = HierarchyProvider::new(DownEngine, MemoryDocuments::new());
    let item = provider
        .call_hierarchy("a.ts", Position::new(0, 0), CallDirection::Incoming, 1, &cancel)
        .await;
    assert!(item.is_none());

    // Below the root: a previously returned item resolves to empty edges
    // instead of an error.
    let stranded = HierarchyItem {
        uri: "a.ts".to_string(),
        name: "orphan".to_string(),
        kind: SymbolKind::Function,
        range: Range::new(Position::new(0, 0), Position::new(2, 1)),
        selection_range: Range::new(Position::new(0, 9), Position::new(0, 15)),
        edges: None,
    };
    let resolved = provider
        .resolve_call_item(stranded, CallDirection::Incoming, 1, &cancel)
        .await;
    assert_eq!(resolved.edges, Some(Vec::new()));
}

#[tokio::test]
async fn test_outgoing_over_fs_documents() {
    // The same walk works when declaration text comes from disk instead of
    // memory.
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("main.ts"), MAIN_TS).unwrap();
    std::fs::write(dir.path().join("two.ts"), TWO_TS).unwrap();
    std::fs::write(dir.path().join("three.ts"), THREE_TS).unwrap();

    let provider = workspace().provider_with_docs(FsDocuments::with_root(dir.path()));
    let cancel = CancellationToken::new();

    let item = provider
        .call_hierarchy(
            "main.ts",
            position_of(MAIN_TS, "main"),
            CallDirection::Outgoing,
            1,
            &cancel,
        )
        .await
        .unwrap();

    let edges = item.edges.as_ref().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].item.name, "callThreeTwice");
}
