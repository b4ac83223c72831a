//! Suite-level prefabrication behavior, driven through the runner the
//! way a host framework would schedule groups and tests.

use std::sync::Arc;

use prefab::prelude::*;
use serde_json::json;

fn named(name: &str) -> Attributes {
    Attributes::from([("name".to_string(), json!(name))])
}

fn run(suite: &Suite, store: &Arc<MemoryStore>) -> RunReport {
    SuiteRunner::new(store.clone(), suite.config())
        .run(suite)
        .unwrap()
}

#[test]
fn test_prefabrication_hooks_fire_in_the_right_order() {
    let suite = Suite::new(FixtureConfig::default());
    let group = suite.root("with prefabrication hooks");

    group.before_lifecycle(|ctx| {
        ctx.push("events", json!("before_prefab"));
        Ok(())
    });
    group.after_lifecycle(|ctx| {
        ctx.push("events", json!("after_prefab"));
        Ok(())
    });
    group
        .declare_fixture("test_thing", |ctx| {
            ctx.push("events", json!("prefab"));
            Ok(ctx.create("thing", named("thing1"))?)
        })
        .unwrap();

    group.test("hooks wrap fabrication", |ctx| {
        let expected = json!(["before_prefab", "prefab", "after_prefab"]);
        anyhow::ensure!(ctx.get("events") == Some(&expected), "got {:?}", ctx.get("events"));
        Ok(())
    });

    let store = Arc::new(MemoryStore::new());
    let report = run(&suite, &store);
    assert!(report.success(), "{:?}", report.failures);
    assert_eq!(report.tests_run, 1);
}

#[test]
fn test_global_hooks_wrap_scope_hooks() {
    let suite = Suite::new(FixtureConfig::default());
    suite.before_prefabrication(|ctx| {
        ctx.push("events", json!("global_before"));
        Ok(())
    });
    suite.after_prefabrication(|ctx| {
        ctx.push("events", json!("global_after"));
        Ok(())
    });

    let group = suite.root("group");
    group.before_lifecycle(|ctx| {
        ctx.push("events", json!("scope_before"));
        Ok(())
    });
    group.after_lifecycle(|ctx| {
        ctx.push("events", json!("scope_after"));
        Ok(())
    });
    group
        .declare_fixture("obj", |ctx| {
            ctx.push("events", json!("prefab"));
            Ok(ctx.create("thing", named("thing1"))?)
        })
        .unwrap();

    group.test("global hooks run strictly outside", |ctx| {
        let expected = json!([
            "global_before",
            "scope_before",
            "prefab",
            "scope_after",
            "global_after"
        ]);
        anyhow::ensure!(ctx.get("events") == Some(&expected), "got {:?}", ctx.get("events"));
        Ok(())
    });

    let report = run(&suite, &Arc::new(MemoryStore::new()));
    assert!(report.success(), "{:?}", report.failures);
}

#[test]
fn test_ancestor_hooks_nest_outside_in_and_inside_out() {
    let suite = Suite::new(FixtureConfig::default());
    let parent = suite.root("parent");
    let child = parent.child("child");

    parent.before_lifecycle(|ctx| {
        ctx.push("events", json!("a"));
        Ok(())
    });
    parent.after_lifecycle(|ctx| {
        ctx.push("events", json!("a_after"));
        Ok(())
    });
    child.before_lifecycle(|ctx| {
        ctx.push("events", json!("b"));
        Ok(())
    });
    child.after_lifecycle(|ctx| {
        ctx.push("events", json!("b_after"));
        Ok(())
    });
    child
        .declare_fixture("obj", |ctx| {
            ctx.push("events", json!("prefab"));
            Ok(ctx.create("thing", named("thing1"))?)
        })
        .unwrap();

    child.test("setup and teardown pair LIFO", |ctx| {
        let expected = json!(["a", "b", "prefab", "b_after", "a_after"]);
        anyhow::ensure!(ctx.get("events") == Some(&expected), "got {:?}", ctx.get("events"));
        Ok(())
    });

    let report = run(&suite, &Arc::new(MemoryStore::new()));
    assert!(report.success(), "{:?}", report.failures);
}

#[test]
fn test_dependent_fixtures_link_by_identifier() {
    let suite = Suite::new(FixtureConfig::default());
    let group = suite.root("dependent objects");

    group
        .declare_fixture("owner", |ctx| Ok(ctx.create("owner", named("owner1"))?))
        .unwrap();
    group
        .declare_fixture("thing", |ctx| {
            let owner = ctx.fixture("owner")?;
            let mut attrs = named("thing1");
            attrs.insert("owner_id".to_string(), json!(owner.id()));
            Ok(ctx.create("thing", attrs)?)
        })
        .unwrap();

    group.test("thing belongs to owner", |ctx| {
        let owner = ctx.fixture("owner")?;
        let thing = ctx.fixture("thing")?;
        anyhow::ensure!(thing.get("owner_id") == Some(&json!(owner.id())));
        Ok(())
    });

    let report = run(&suite, &Arc::new(MemoryStore::new()));
    assert!(report.success(), "{:?}", report.failures);
}

#[test]
fn test_fixtures_are_visible_directly_and_through_the_store() {
    let suite = Suite::new(FixtureConfig::default());
    let group = suite.root("within a context");
    group
        .declare_fixture("obj", |ctx| Ok(ctx.create("thing", named("thing1"))?))
        .unwrap();

    group.test("direct access", |ctx| {
        anyhow::ensure!(ctx.scope().resolves("obj"));
        let obj = ctx.fixture("obj")?;
        anyhow::ensure!(obj.kind() == "thing");
        Ok(())
    });
    group.test("indirect access", |ctx| {
        let obj = ctx.fixture("obj")?;
        anyhow::ensure!(ctx.store().count("thing") == 1);
        let fetched = ctx.store().fetch("thing", obj.id())?;
        anyhow::ensure!(fetched.id() == obj.id());
        Ok(())
    });

    let report = run(&suite, &Arc::new(MemoryStore::new()));
    assert!(report.success(), "{:?}", report.failures);
}

#[test]
fn test_sibling_scopes_do_not_share_fixtures() {
    let suite = Suite::new(FixtureConfig::default());
    let root = suite.root("suite");

    let with_obj = root.child("within a context");
    with_obj
        .declare_fixture("obj", |ctx| Ok(ctx.create("thing", named("thing1"))?))
        .unwrap();
    with_obj.test("sees its own fixture", |ctx| {
        anyhow::ensure!(ctx.scope().resolves("obj"));
        anyhow::ensure!(ctx.store().count("thing") == 1);
        Ok(())
    });

    let without = root.child("within a different context");
    without.test("no direct access", |ctx| {
        anyhow::ensure!(!ctx.scope().resolves("obj"));
        anyhow::ensure!(matches!(
            ctx.fixture("obj"),
            Err(FixtureError::Unresolved(_))
        ));
        Ok(())
    });
    without.test("no indirect access", |ctx| {
        anyhow::ensure!(ctx.store().count("thing") == 0);
        Ok(())
    });

    let report = run(&suite, &Arc::new(MemoryStore::new()));
    assert!(report.success(), "{:?}", report.failures);
}

#[test]
fn test_parent_fixtures_are_visible_in_children_but_not_vice_versa() {
    let suite = Suite::new(FixtureConfig::default());
    let parent = suite.root("within a parent context");
    parent
        .declare_fixture("parent_obj", |ctx| Ok(ctx.create("thing", named("parent"))?))
        .unwrap();

    let child = parent.child("within a child context");
    child
        .declare_fixture("child_obj", |ctx| Ok(ctx.create("thing", named("child"))?))
        .unwrap();

    child.test("sees the parent's fixture", |ctx| {
        anyhow::ensure!(ctx.scope().resolves("parent_obj"));
        anyhow::ensure!(ctx.fixture("parent_obj")?.kind() == "thing");
        Ok(())
    });
    child.test("sees its own fixture", |ctx| {
        anyhow::ensure!(ctx.scope().resolves("child_obj"));
        anyhow::ensure!(ctx.fixture("child_obj")?.kind() == "thing");
        Ok(())
    });

    parent.test("sees its own fixture", |ctx| {
        anyhow::ensure!(ctx.scope().resolves("parent_obj"));
        anyhow::ensure!(ctx.store().count("thing") == 1);
        Ok(())
    });
    parent.test("does not see the child's fixture", |ctx| {
        anyhow::ensure!(!ctx.scope().resolves("child_obj"));
        anyhow::ensure!(matches!(
            ctx.fixture("child_obj"),
            Err(FixtureError::Unresolved(_))
        ));
        anyhow::ensure!(ctx.store().count("thing") == 1);
        Ok(())
    });

    let report = run(&suite, &Arc::new(MemoryStore::new()));
    assert!(report.success(), "{:?}", report.failures);
    assert_eq!(report.tests_run, 4);
}

#[test]
fn test_multiple_fixtures_in_one_scope() {
    let suite = Suite::new(FixtureConfig::default());
    let group = suite.root("with multiple prefabricated objects");
    group
        .declare_fixture("obj1", |ctx| Ok(ctx.create("thing", named("one"))?))
        .unwrap();
    group
        .declare_fixture("obj2", |ctx| Ok(ctx.create("thing", named("two"))?))
        .unwrap();

    group.test("both resolve, distinctly", |ctx| {
        let obj1 = ctx.fixture("obj1")?;
        let obj2 = ctx.fixture("obj2")?;
        anyhow::ensure!(obj1.id() != obj2.id());
        anyhow::ensure!(ctx.store().count("thing") == 2);
        Ok(())
    });

    let report = run(&suite, &Arc::new(MemoryStore::new()));
    assert!(report.success(), "{:?}", report.failures);
}

#[test]
fn test_child_declaration_shadows_the_parent() {
    let suite = Suite::new(FixtureConfig::default());
    let parent = suite.root("parent");
    parent
        .declare_fixture("obj", |ctx| Ok(ctx.create("parent_kind", named("p"))?))
        .unwrap();

    let child = parent.child("child");
    child
        .declare_fixture("obj", |ctx| Ok(ctx.create("child_kind", named("c"))?))
        .unwrap();

    parent.test("resolves its own declaration", |ctx| {
        anyhow::ensure!(ctx.fixture("obj")?.kind() == "parent_kind");
        Ok(())
    });
    child.test("shadowing wins at the child", |ctx| {
        anyhow::ensure!(ctx.fixture("obj")?.kind() == "child_kind");
        Ok(())
    });

    let report = run(&suite, &Arc::new(MemoryStore::new()));
    assert!(report.success(), "{:?}", report.failures);
}
