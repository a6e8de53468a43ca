pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  created_at TEXT NOT NULL,
  ok INTEGER NOT NULL,
  return_code INTEGER NOT NULL,
  raw_output TEXT NOT NULL,
  triage_json TEXT NOT NULL,
  all_tests_json TEXT NOT NULL,
  failed_tests_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_runs_created_at ON runs(created_at);
"#;
