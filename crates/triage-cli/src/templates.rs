pub const GITIGNORE: &str = "/.triage/\n*.db\n*.db-shm\n*.db-wal\n";
