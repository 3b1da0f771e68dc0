pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    is_self INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS challenge_binary_nodes (
    id TEXT PRIMARY KEY,
    cs_id TEXT NOT NULL,
    name TEXT NOT NULL,
    parent_id TEXT REFERENCES challenge_binary_nodes(id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS exploits (
    id TEXT PRIMARY KEY,
    cbn_id TEXT NOT NULL REFERENCES challenge_binary_nodes(id) ON DELETE CASCADE,
    blob BLOB NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS exploit_submissions (
    exploit_id TEXT NOT NULL REFERENCES exploits(id) ON DELETE CASCADE,
    team_name TEXT NOT NULL,
    round INTEGER NOT NULL,
    submitted_at TEXT NOT NULL,
    PRIMARY KEY (exploit_id, team_name)
);

CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    cbn_id TEXT NOT NULL REFERENCES challenge_binary_nodes(id) ON DELETE CASCADE,
    limit_cpus INTEGER NOT NULL,
    limit_memory INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'queued',
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_exploits_cbn ON exploits(cbn_id);
CREATE INDEX IF NOT EXISTS idx_jobs_kind_cbn ON jobs(kind, cbn_id);
CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
";
