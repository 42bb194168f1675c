//! SQLite schema definitions
//!
//! Initial schema with all tables. No migrations needed for first version.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Users (org members, wholesale-replaced on users/detail-users sync)
-- =============================================================================
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    login TEXT NOT NULL UNIQUE,
    name TEXT,
    email TEXT,
    company TEXT,
    location TEXT,
    remote_created_at INTEGER,
    remote_updated_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_users_login ON users(login);

-- =============================================================================
-- 2. Teams (slug is the canonical identifier, never the display name)
-- =============================================================================
CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY,
    slug TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT,
    privacy TEXT,
    permission TEXT
);

CREATE INDEX IF NOT EXISTS idx_teams_slug ON teams(slug);

-- =============================================================================
-- 3. Repositories
-- =============================================================================
CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    description TEXT,
    private INTEGER NOT NULL DEFAULT 0,
    language TEXT,
    size INTEGER NOT NULL DEFAULT 0,
    stargazers INTEGER NOT NULL DEFAULT 0,
    watchers INTEGER NOT NULL DEFAULT 0,
    forks INTEGER NOT NULL DEFAULT 0,
    remote_created_at INTEGER,
    remote_updated_at INTEGER,
    remote_pushed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_repositories_name ON repositories(name);

-- =============================================================================
-- 4. Team memberships (replaced per team slug, never across teams)
-- =============================================================================
CREATE TABLE IF NOT EXISTS team_memberships (
    team_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    team_slug TEXT NOT NULL,
    user_login TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'member',
    remote_created_at INTEGER,
    PRIMARY KEY (team_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_team_memberships_slug ON team_memberships(team_slug);

-- =============================================================================
-- 5. Repository collaborators / team grants (replaced per repository)
-- =============================================================================
CREATE TABLE IF NOT EXISTS repo_collaborators (
    repo_name TEXT NOT NULL,
    user_login TEXT NOT NULL,
    permission TEXT,
    PRIMARY KEY (repo_name, user_login)
);

CREATE INDEX IF NOT EXISTS idx_repo_collaborators_repo ON repo_collaborators(repo_name);

CREATE TABLE IF NOT EXISTS repo_team_grants (
    repo_name TEXT NOT NULL,
    team_slug TEXT NOT NULL,
    permission TEXT,
    PRIMARY KEY (repo_name, team_slug)
);

CREATE INDEX IF NOT EXISTS idx_repo_team_grants_repo ON repo_team_grants(repo_name);

-- =============================================================================
-- 6. Outside collaborators (org-level listing, wholesale-replaced)
-- =============================================================================
CREATE TABLE IF NOT EXISTS outside_collaborators (
    id INTEGER PRIMARY KEY,
    login TEXT NOT NULL UNIQUE
);

-- =============================================================================
-- 7. Token permission snapshot (single current row, fully replaced)
-- =============================================================================
CREATE TABLE IF NOT EXISTS token_permissions (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    login TEXT NOT NULL,
    scopes TEXT NOT NULL DEFAULT '',
    rate_limit INTEGER NOT NULL DEFAULT 0,
    rate_remaining INTEGER NOT NULL DEFAULT 0,
    rate_reset INTEGER NOT NULL DEFAULT 0,
    fetched_at INTEGER NOT NULL
);
"#;
