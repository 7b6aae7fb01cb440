mod common;

use serde_json::json;

use bramble::ErrorKind;
use bramble::prelude::*;

use common::{
    Author, MockBackend, avatar_relation, followers_relation, friends_relation, graph,
    graph_with, posts_relation,
};

const AUTHOR_BODY: &str = "name\nuid\ncreated_at\nupdated_at\ndeleted_at";

#[test]
fn compiles_edge_query_with_facet_projection() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let text = g.relation(&parent, friends_relation()).compile();
    assert_eq!(
        text,
        format!(
            "{{\n  q(func: uid(<0x1>)) {{\n    \
             follow (orderdesc: created_at) @facets(weight: weight) \
             @filter(not has(deleted_at)) {{\n{AUTHOR_BODY}\n    }}\n  }}\n}}"
        )
    );
}

#[test]
fn compiles_plain_edge_without_facets() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let text = g.relation(&parent, posts_relation()).take(3).compile();
    assert!(text.contains(
        "post (orderdesc: created_at) @filter(not has(deleted_at)) (first: 3) {"
    ));
}

#[test]
fn facet_sort_moves_ordering_into_facets() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let text = g
        .relation(&parent, friends_relation())
        .sort("weight", Order::Asc)
        .compile();
    assert!(text.contains("follow @facets(orderasc: weight, weight: weight)"));
    assert!(!text.contains("(orderasc: weight) @facets"));
}

#[test]
fn facet_filters_compile_separately_from_child_filters() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let text = g
        .relation(&parent, friends_relation())
        .r#where("weight", 5)
        .r#where("name", "bob")
        .compile();
    assert!(text.contains("@facets(eq(weight, 5))"));
    assert!(text.contains(r#"@filter(eq(name, "bob") and not has(deleted_at))"#));
}

#[test]
fn facet_sorted_paging_filters_on_the_facet() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let text = g
        .relation(&parent, friends_relation())
        .sort("weight", Order::Asc)
        .paging(1, 10, 5)
        .compile();
    assert!(text.contains("@facets(ge(weight, 1) and lt(weight, 10))"));
    assert!(text.contains("(first: 5)"));
}

#[test]
fn reverse_edges_are_queryable() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let text = g.relation(&parent, followers_relation()).compile();
    assert!(text.contains("~follow (orderdesc: created_at)"));
}

#[test]
fn all_unwraps_children() {
    let backend = MockBackend::new().respond_with(json!({
        "q": [{"follow": [
            {"uid": "0x2", "name": "bob"},
            {"uid": "0x3", "name": "eve"},
        ]}]
    }));
    let g = graph_with(backend);
    let parent = Author::saved("0x1", "ada");

    let rows = g.relation(&parent, friends_relation()).all().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], json!("bob"));
}

#[test]
fn flattened_single_child_decodes_as_one() {
    let backend = MockBackend::new().respond_with(json!({
        "q": [{"follow": {"uid": "0x2", "name": "bob"}}]
    }));
    let g = graph_with(backend);
    let parent = Author::saved("0x1", "ada");

    let rows = g.relation(&parent, friends_relation()).all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["uid"], json!("0x2"));
}

#[test]
fn absent_edge_is_an_empty_result() {
    let backend = MockBackend::new().respond_with(json!({"q": [{"uid": "0x1"}]}));
    let g = graph_with(backend);
    let parent = Author::saved("0x1", "ada");
    assert!(g.relation(&parent, friends_relation()).all().unwrap().is_empty());
}

#[test]
fn first_limits_to_one_child() {
    let backend = MockBackend::new().respond_with(json!({
        "q": [{"follow": [{"uid": "0x2", "name": "bob"}]}]
    }));
    let g = graph_with(backend);
    let parent = Author::saved("0x1", "ada");

    let row = g
        .relation(&parent, friends_relation())
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(row["name"], json!("bob"));
    assert!(g.backend().queries[0].contains("(first: 1)"));
}

#[test]
fn count_scopes_to_the_edge() {
    let backend = MockBackend::new().respond_with(json!({
        "q": [{"follow": [{"count": 7}]}]
    }));
    let g = graph_with(backend);
    let parent = Author::saved("0x1", "ada");

    let n = g.relation(&parent, friends_relation()).count().unwrap();
    assert_eq!(n, 7);
    assert!(g.backend().queries[0].contains("count(uid)"));
}

#[test]
fn count_of_malformed_node_is_a_decode_error() {
    let backend = MockBackend::new().respond_with(json!({
        "q": [{"follow": [{"count": "seven"}]}]
    }));
    let g = graph_with(backend);
    let parent = Author::saved("0x1", "ada");

    let err = g.relation(&parent, friends_relation()).count().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Decode);
}

#[test]
fn add_stages_a_link_document() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let child = Author::saved("0x2", "bob");

    g.relation(&parent, friends_relation()).add(&child);
    assert_eq!(
        g.backend().inserted,
        vec![json!({"uid": "0x1", "follow": {"uid": "0x2"}})]
    );
}

#[test]
fn add_with_facets_annotates_the_edge() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let child = Author::saved("0x2", "bob");

    g.relation(&parent, friends_relation())
        .add_with(&child, &[("weight", Literal::from(5))]);
    assert_eq!(
        g.backend().inserted,
        vec![json!({"uid": "0x1", "follow": {"uid": "0x2", "follow|weight": 5}})]
    );
}

#[test]
fn add_accepts_uncommitted_children() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let mut child = Author::named("bob");
    child.meta.uid = Uid::new("_:node1");

    g.relation(&parent, friends_relation()).add(&child);
    assert_eq!(
        g.backend().inserted,
        vec![json!({"uid": "0x1", "follow": {"uid": "_:node1"}})]
    );
}

#[test]
fn add_refuses_single_cardinality_and_reverse_edges() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let child = Author::saved("0x2", "bob");

    let mut post = common::Post::default();
    post.meta.uid = Uid::new("0x9");
    g.relation(&parent, avatar_relation()).add(&post);
    g.relation(&parent, followers_relation()).add(&child);
    assert!(g.backend().inserted.is_empty());
}

#[test]
fn add_refuses_unpersisted_parent() {
    let g = graph();
    let parent = Author::named("ada");
    let child = Author::saved("0x2", "bob");

    g.relation(&parent, friends_relation()).add(&child);
    assert!(g.backend().inserted.is_empty());
}

#[test]
fn remove_stages_a_delete_document() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let child = Author::saved("0x2", "bob");

    g.relation(&parent, friends_relation()).remove(&child);
    assert_eq!(
        g.backend().deleted,
        vec![json!({"uid": "0x1", "follow": {"uid": "0x2"}})]
    );
    assert!(g.backend().inserted.is_empty());
}

#[test]
fn remove_requires_both_ends_persisted() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let mut child = Author::named("bob");
    child.meta.uid = Uid::new("_:node1");

    g.relation(&parent, friends_relation()).remove(&child);
    assert!(g.backend().deleted.is_empty());
}

#[test]
fn clear_stages_a_null_edge_delete() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");

    g.relation(&parent, friends_relation()).clear();
    assert_eq!(
        g.backend().deleted,
        vec![json!({"uid": "0x1", "follow": null})]
    );
}

#[test]
fn set_replaces_the_single_child() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let mut pic = common::Post::default();
    pic.meta.uid = Uid::new("0x9");

    g.relation(&parent, avatar_relation()).set(&pic);
    assert_eq!(
        g.backend().deleted,
        vec![json!({"uid": "0x1", "avatar": null})]
    );
    assert_eq!(
        g.backend().inserted,
        vec![json!({"uid": "0x1", "avatar": {"uid": "0x9"}})]
    );
}

#[test]
fn set_refuses_many_cardinality_edges() {
    let g = graph();
    let parent = Author::saved("0x1", "ada");
    let child = Author::saved("0x2", "bob");

    g.relation(&parent, friends_relation()).set(&child);
    assert!(g.backend().inserted.is_empty());
    assert!(g.backend().deleted.is_empty());
}
