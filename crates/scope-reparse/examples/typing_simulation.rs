use scope_reparse::{LocalTaskQueue, ReparseConfig, ReparseDocument, ScopeKind};
use std::cell::Cell;
use std::rc::Rc;

fn main() {
    // RUST_LOG=scope_reparse=trace shows every cycle.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let mut source = String::from("class Demo {\n");
    for i in 0..5_000 {
        source.push_str(&format!("  int field{i} = {i};\n"));
    }
    source.push_str("}\n");

    let tasks = LocalTaskQueue::new();
    let doc = ReparseDocument::on_open(&source, ReparseConfig::default(), Rc::new(tasks.clone()));

    let batches = Rc::new(Cell::new(0usize));
    let counter = batches.clone();
    doc.subscribe(move |batch| {
        counter.set(counter.get() + 1);
        println!(
            "batch {}: {} regions, {} refreshed ranges",
            batch.generation,
            batch.regions.len(),
            batch.refreshed.len()
        );
    })
    .unwrap();

    let turns = tasks.run_until_idle(usize::MAX);
    println!("initial parse finished after {turns} host turns");

    // Type an unterminated block comment, one keystroke per host turn.
    let mut offset = "class Demo {\n".len();
    for ch in ["/", "*", " ", "w", "i", "p"] {
        doc.on_edit(offset..offset, ch).unwrap();
        offset += 1;
        tasks.run_next();
    }
    let turns = tasks.run_until_idle(usize::MAX);
    println!("comment opened, settled after {turns} more turns");

    let comments = doc
        .get_scope_regions()
        .iter()
        .filter(|region| region.descriptor.kind == ScopeKind::Comment)
        .count();
    println!("{comments} comment regions painted");

    doc.on_edit(offset..offset, " */").unwrap();
    let turns = tasks.run_until_idle(usize::MAX);
    println!(
        "comment closed, settled after {turns} more turns; {} batches published",
        batches.get()
    );
}
