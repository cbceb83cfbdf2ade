use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use table_exporter::config::{load_config, ExportConfig};
use table_exporter::execution::{
    BatchReport, BatchRunner, ExecutionOptions, MappingJob, MappingStatus, TracingObserver,
};
use table_exporter::processor::ResolutionPolicy;
use table_exporter::ExportError;

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("table-exporter-{name}-{nanos}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .replace('\\', "/")
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("client_column_mapping.yaml");
    std::fs::write(&path, body).unwrap();
    path
}

fn jobs_for(config_path: &Path) -> Vec<MappingJob> {
    let config = load_config(config_path).unwrap();
    MappingJob::from_config(config_path, &config)
}

fn runner(resolution: ResolutionPolicy) -> BatchRunner {
    BatchRunner::new(ExecutionOptions {
        num_threads: Some(2),
        resolution,
        dry_run: false,
    })
    .unwrap()
    .with_observer(Arc::new(TracingObserver))
}

#[test]
fn item_mapping_end_to_end() {
    let dir = tmp_dir("item");
    let out = dir.join("client");
    let config = write_config(
        &dir,
        &format!(
            r#"
mappings:
  - name: Item
    importPath: "{items}"
    exportPath: "{out}"
    sourceColumns: [ID, Price]
    targetColumns: [itemId, price]
"#,
            items = fixture("items.csv"),
            out = out.to_string_lossy().replace('\\', "/"),
        ),
    );

    let outcomes = runner(ResolutionPolicy::Strict).run(&jobs_for(&config));
    assert_eq!(outcomes.len(), 1);
    let summary = outcomes[0].result.as_ref().unwrap();
    assert_eq!(summary.output_rows, 3);

    let csv = std::fs::read_to_string(out.join("csv/Item.csv")).unwrap();
    assert_eq!(csv, "itemId,price\n1,2.5\n2,7\n3,30\n");

    let cs = std::fs::read_to_string(out.join("cs/Item.cs")).unwrap();
    assert_eq!(
        cs,
        "using GameFramework;\n\nnamespace LOP.MasterData\n{\n    public sealed class Item : IMasterData\n    {\n        public int ItemId { get; private set; }\n        public float Price { get; private set; }\n    }\n}"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn filters_types_and_codegen_block() {
    let dir = tmp_dir("monster");
    let out = dir.join("server");
    let config = write_config(
        &dir,
        &format!(
            r#"
codegen:
  usings: []
  namespace: Game.Data
  baseType: ITable
mappings:
  - name: Monster
    importPath: "{monsters}"
    exportPath: "{out}"
    sourceColumns: [Name, Level, DropRate]
    targetColumns: [monster_name, level, drop_rate]
    filters:
      level: value >= 4
      drop_rate: value == value
"#,
            monsters = fixture("monsters.csv"),
            out = out.to_string_lossy().replace('\\', "/"),
        ),
    );

    let outcomes = runner(ResolutionPolicy::Strict).run(&jobs_for(&config));
    assert!(outcomes[0].is_success(), "{:?}", outcomes[0].result);

    let csv = std::fs::read_to_string(out.join("csv/Monster.csv")).unwrap();
    assert_eq!(csv, "monster_name,level,drop_rate\nGoblin,4,0.25\nOrc,9,0.1\n");

    let cs = std::fs::read_to_string(out.join("cs/Monster.cs")).unwrap();
    assert!(cs.starts_with("namespace Game.Data\n{\n    public sealed class Monster : ITable\n"));
    assert!(cs.contains("public string MonsterName { get; private set; }"));
    assert!(cs.contains("public int Level { get; private set; }"));
    assert!(cs.contains("public double DropRate { get; private set; }"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn one_bad_mapping_does_not_abort_the_batch() {
    let dir = tmp_dir("isolation");
    let out = dir.join("client");
    let config = write_config(
        &dir,
        &format!(
            r#"
mappings:
  - name: Broken
    importPath: "{items}"
    exportPath: "{out}"
    sourceColumns: [ID, Weight]
    targetColumns: [id, weight]
  - name: Item
    importPath: "{items}"
    exportPath: "{out}"
    sourceColumns: [Name, Active]
    targetColumns: [name, active]
  - name: Mismatched
    importPath: "{items}"
    exportPath: "{out}"
    sourceColumns: [ID]
    targetColumns: [id, extra]
"#,
            items = fixture("items.csv"),
            out = out.to_string_lossy().replace('\\', "/"),
        ),
    );

    let runner = runner(ResolutionPolicy::Strict);
    let outcomes = runner.run(&jobs_for(&config));
    assert_eq!(outcomes.len(), 3);
    match &outcomes[0].result {
        Err(ExportError::MissingColumns { columns, .. }) => assert_eq!(columns, &vec!["Weight".to_string()]),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(outcomes[1].is_success());
    assert!(matches!(outcomes[2].result, Err(ExportError::InvalidMapping { .. })));

    assert!(!out.join("cs/Broken.cs").exists());
    assert_eq!(
        std::fs::read_to_string(out.join("csv/Item.csv")).unwrap(),
        "name,active\nPotion,True\nEther,False\nElixir,True\n"
    );

    let report = BatchReport::new(&outcomes, runner.metrics().snapshot());
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.mappings[1].status, MappingStatus::Exported);

    let report_path = dir.join("report").join("run.json");
    report.write_json(&report_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["failed"], 2);
    assert_eq!(json["mappings"][0]["name"], "Broken");
    assert_eq!(json["mappings"][0]["status"], "failed");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn lenient_policy_writes_shifted_class_but_fails_dataset() {
    let dir = tmp_dir("lenient");
    let config = ExportConfig::from_yaml_str(
        &format!(
            r#"
mappings:
  - name: Item
    importPath: "{items}"
    exportPath: "{out}"
    sourceColumns: [Weight, ID]
    targetColumns: [weight, id]
"#,
            items = fixture("items.csv"),
            out = dir.to_string_lossy().replace('\\', "/"),
        ),
        Path::new("inline.yaml"),
    )
    .unwrap();

    let jobs = MappingJob::from_config(Path::new("inline.yaml"), &config);
    let outcomes = runner(ResolutionPolicy::Lenient).run(&jobs);
    assert!(matches!(outcomes[0].result, Err(ExportError::MissingColumns { .. })));

    let code = std::fs::read_to_string(dir.join("cs").join("Item.cs")).unwrap();
    assert!(code.contains("public int Weight { get; private set; }"));
    assert!(!code.contains(" Id {"));
    assert!(!dir.join("csv").join("Item.csv").exists());

    let strict = runner(ResolutionPolicy::Strict).run(&jobs);
    assert!(matches!(strict[0].result, Err(ExportError::MissingColumns { .. })));

    let _ = std::fs::remove_dir_all(&dir);
}
