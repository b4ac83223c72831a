// Example: Fixture Prefabrication Demo
//
// This example demonstrates the full fixture lifecycle:
// - declaring shared fixtures on nested scopes
// - before/after prefabrication hooks
// - per-test cache clearing and re-fetch by identifier
// - transactional rollback at group end
//
// Run this example with:
//   cargo run --example suite_demo

use std::sync::Arc;

use prefab::prelude::*;
use serde_json::json;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("========================================");
    println!("prefab: transactional fixture lifecycle");
    println!("========================================\n");

    let store = Arc::new(MemoryStore::new());
    let suite = Suite::new(FixtureConfig::default());

    suite.before_prefabrication(|_| {
        println!("  [hook] global before-prefabrication");
        Ok(())
    });
    suite.after_prefabrication(|_| {
        println!("  [hook] global after-prefabrication");
        Ok(())
    });

    let group = suite.root("widgets");
    group.before_lifecycle(|_| {
        println!("  [hook] widgets before-prefabrication");
        Ok(())
    });

    group.declare_fixture("owner", |ctx| {
        println!("  [fab ] constructing 'owner'");
        let attrs = Attributes::from([("name".to_string(), json!("owner1"))]);
        Ok(ctx.create("owner", attrs)?)
    })?;
    group.declare_fixture("widget", |ctx| {
        println!("  [fab ] constructing 'widget'");
        let owner = ctx.fixture("owner")?;
        let attrs = Attributes::from([
            ("name".to_string(), json!("widget1")),
            ("owner_id".to_string(), json!(owner.id())),
        ]);
        Ok(ctx.create("widget", attrs)?)
    })?;

    group.test("widget belongs to owner", |ctx| {
        let owner = ctx.fixture("owner")?;
        let widget = ctx.fixture("widget")?;
        println!(
            "  [test] widget #{} owned by owner #{}",
            widget.id(),
            owner.id()
        );
        anyhow::ensure!(widget.get("owner_id") == Some(&json!(owner.id())));
        Ok(())
    });
    group.test("each test re-fetches fresh state", |ctx| {
        let widget = ctx.fixture("widget")?;
        println!("  [test] widget re-fetched, name = {:?}", widget.get("name"));
        anyhow::ensure!(widget.get("name") == Some(&json!("widget1")));
        Ok(())
    });

    let nested = group.child("with extra state");
    nested.declare_fixture("gadget", |ctx| {
        println!("  [fab ] constructing 'gadget' in nested scope");
        Ok(ctx.create("gadget", Attributes::new())?)
    })?;
    nested.test("sees parent and own fixtures", |ctx| {
        let widget = ctx.fixture("widget")?;
        let gadget = ctx.fixture("gadget")?;
        println!(
            "  [test] nested test sees widget #{} and gadget #{}",
            widget.id(),
            gadget.id()
        );
        Ok(())
    });

    println!("Running the suite...\n");
    let runner = SuiteRunner::new(store.clone(), suite.config());
    let report = runner.run(&suite)?;

    println!("\nRun report:");
    println!("{}", report.to_json()?);

    println!("\nRows left after rollback:");
    println!("  owners:  {}", store.count("owner"));
    println!("  widgets: {}", store.count("widget"));
    println!("  gadgets: {}", store.count("gadget"));

    println!("\n========================================");
    println!("Demo completed, everything rolled back");
    println!("========================================");
    Ok(())
}
