//! Clap CLI definitions for the `cp` command.
//!
//! One noun per subsystem (§4.12); each noun carries its own verb
//! subcommand. Global flags are parsed once into [`GlobalArgs`] and threaded
//! by reference into every handler.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// cp -- the context palace command-line tool.
#[derive(Parser, Debug)]
#[command(name = "cp", about = "Shard/edge graph store for agent memory, knowledge and work", version, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands (§4.12).
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Project scope (default: resolved from config/current directory name).
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Acting agent identity (default: resolved through the identity chain).
    #[arg(long, global = true)]
    pub agent: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Default result limit for list-like commands.
    #[arg(long, global = true, default_value_t = 20)]
    pub limit: usize,

    /// Raise tracing verbosity to debug.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Explicit config file path, layered above the project/global files.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generic shard CRUD and graph operations.
    Shard(ShardArgs),
    /// Semantic (vector) search over embedded shards.
    Recall(RecallArgs),
    /// Hierarchical agent memory.
    Memory(MemoryArgs),
    /// Versioned knowledge documents.
    Knowledge(KnowledgeArgs),
    /// Requirement lifecycle.
    Requirement(RequirementArgs),
    /// Epics grouping work.
    Epic(EpicArgs),
    /// Per-agent active-epic pointer.
    Focus(FocusArgs),
    /// Convenience verbs over a single work item.
    Task(TaskArgs),
    /// Link an artifact shard to a requirement.
    Artifact(ArtifactArgs),
    /// Project-wide statistics.
    Status,
    /// Scaffold a new `.palace/` project directory.
    Init(InitArgs),
    /// Refresh scaffolded template files to the current version.
    Update,
    /// Maintenance operations.
    Admin(AdminArgs),
    /// Generate shell completion scripts.
    Completion(CompletionArgs),
}

// ---------------------------------------------------------------------------
// shard
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ShardArgs {
    #[command(subcommand)]
    pub command: ShardCommands,
}

#[derive(Subcommand, Debug)]
pub enum ShardCommands {
    /// List shards, optionally filtered.
    List(ShardListArgs),
    /// Show a single shard.
    Show(ShardShowArgs),
    /// Create a shard.
    Create(ShardCreateArgs),
    /// Update a shard's fields.
    Update(ShardUpdateArgs),
    /// Close a shard.
    Close(ShardCloseArgs),
    /// Reopen a closed shard.
    Reopen(ShardIdArgs),
    /// Add a typed edge between two shards.
    Link(ShardLinkArgs),
    /// Remove a typed edge between two shards.
    Unlink(ShardLinkArgs),
    /// List edges touching a shard.
    Edges(ShardIdArgs),
    /// Add a label to a shard.
    Label(ShardLabelArgs),
    /// List a shard's labels.
    Labels(ShardIdArgs),
}

#[derive(Args, Debug)]
pub struct ShardListArgs {
    /// Restrict to this shard type.
    #[arg(long = "type")]
    pub shard_type: Option<String>,
    /// Restrict to this status.
    #[arg(long)]
    pub status: Option<String>,
    /// Keyword search instead of a plain listing.
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ShardShowArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ShardIdArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ShardCreateArgs {
    pub title: String,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long = "type", default_value = "task")]
    pub shard_type: String,
    #[arg(long, default_value_t = 2)]
    pub priority: i32,
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShardUpdateArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long)]
    pub priority: Option<i32>,
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShardCloseArgs {
    pub id: String,
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShardLinkArgs {
    pub from: String,
    pub to: String,
    #[arg(long = "type", default_value = "references")]
    pub edge_type: String,
}

#[derive(Args, Debug)]
pub struct ShardLabelArgs {
    pub id: String,
    pub label: String,
}

// ---------------------------------------------------------------------------
// recall
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct RecallArgs {
    pub query: String,
    #[arg(long = "type")]
    pub shard_type: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// memory
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct MemoryArgs {
    #[command(subcommand)]
    pub command: MemoryCommands,
}

#[derive(Subcommand, Debug)]
pub enum MemoryCommands {
    /// Create a root memory shard.
    Add(MemoryAddArgs),
    /// List root memory shards in the project.
    List,
    /// Semantic recall scoped to memory shards.
    Recall(RecallArgs),
    /// Show a memory shard and its direct children.
    Show(ShardIdArgs),
    /// Create a memory sub-entry under a parent.
    AddSub(MemoryAddSubArgs),
    /// Delete a memory shard.
    Delete(MemoryDeleteArgs),
    /// Move a memory shard to a new parent (or the root).
    Move(MemoryMoveArgs),
    /// Detach a memory shard, making it a root.
    Promote(ShardIdArgs),
    /// Print the full subtree rooted at a shard (or every root).
    Tree(MemoryTreeArgs),
    /// List memory shards accessed more than their parent.
    Hot(MemoryHotArgs),
    /// Reconcile pointer-block drift against `child-of` edges.
    Sync(MemorySyncArgs),
}

#[derive(Args, Debug)]
pub struct MemoryAddArgs {
    pub title: String,
    #[arg(long)]
    pub body: Option<String>,
    #[arg(long = "body-file")]
    pub body_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MemoryAddSubArgs {
    pub parent: String,
    pub title: String,
    #[arg(long)]
    pub body: Option<String>,
    #[arg(long = "body-file")]
    pub body_file: Option<PathBuf>,
    /// Explicit summary; skips the AI-summary proposal step.
    #[arg(long)]
    pub summary: Option<String>,
    /// Skip AI assistance entirely; a summary must be supplied explicitly.
    #[arg(long = "no-ai")]
    pub no_ai: bool,
    #[arg(long = "label")]
    pub labels: Vec<String>,
}

#[derive(Args, Debug)]
pub struct MemoryDeleteArgs {
    pub id: String,
    #[arg(long)]
    pub recursive: bool,
}

#[derive(Args, Debug)]
pub struct MemoryMoveArgs {
    pub id: String,
    /// New parent id; omit to promote to root.
    pub new_parent: Option<String>,
}

#[derive(Args, Debug)]
pub struct MemoryTreeArgs {
    pub root: Option<String>,
}

#[derive(Args, Debug)]
pub struct MemoryHotArgs {
    #[arg(long, default_value_t = 0)]
    pub min_depth: usize,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct MemorySyncArgs {
    pub root: Option<String>,
    #[arg(long)]
    pub apply: bool,
}

// ---------------------------------------------------------------------------
// knowledge
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct KnowledgeArgs {
    #[command(subcommand)]
    pub command: KnowledgeCommands,
}

#[derive(Subcommand, Debug)]
pub enum KnowledgeCommands {
    Create(KnowledgeCreateArgs),
    List,
    Show(ShardIdArgs),
    Update(KnowledgeUpdateArgs),
    Append(KnowledgeUpdateArgs),
    History(ShardIdArgs),
    Diff(KnowledgeDiffArgs),
}

#[derive(Args, Debug)]
pub struct KnowledgeCreateArgs {
    pub title: String,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long = "content-file")]
    pub content_file: Option<PathBuf>,
    #[arg(long = "doc-type", default_value = "reference")]
    pub doc_type: String,
    #[arg(long = "label")]
    pub labels: Vec<String>,
}

#[derive(Args, Debug)]
pub struct KnowledgeUpdateArgs {
    pub id: String,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long = "content-file")]
    pub content_file: Option<PathBuf>,
    #[arg(long)]
    pub summary: Option<String>,
}

#[derive(Args, Debug)]
pub struct KnowledgeDiffArgs {
    pub id: String,
    pub from: u32,
    pub to: u32,
}

// ---------------------------------------------------------------------------
// requirement
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct RequirementArgs {
    #[command(subcommand)]
    pub command: RequirementCommands,
}

#[derive(Subcommand, Debug)]
pub enum RequirementCommands {
    Create(RequirementCreateArgs),
    List,
    Show(ShardIdArgs),
    Approve(ShardIdArgs),
    Verify(RequirementVerifyArgs),
    Reopen(RequirementReopenArgs),
    Link(ShardLinkArgs),
    Unlink(ShardLinkArgs),
    Dashboard,
}

#[derive(Args, Debug)]
pub struct RequirementCreateArgs {
    pub title: String,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long, default_value_t = 2)]
    pub priority: i32,
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args, Debug)]
pub struct RequirementVerifyArgs {
    pub id: String,
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct RequirementReopenArgs {
    pub id: String,
    #[arg(long)]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// epic
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct EpicArgs {
    #[command(subcommand)]
    pub command: EpicCommands,
}

#[derive(Subcommand, Debug)]
pub enum EpicCommands {
    Create(EpicCreateArgs),
    Show(EpicShowArgs),
    List,
}

#[derive(Args, Debug)]
pub struct EpicCreateArgs {
    pub title: String,
    #[arg(long)]
    pub content: Option<String>,
    /// Existing shard ids to adopt as direct children.
    #[arg(long = "adopt")]
    pub adopt: Vec<String>,
    /// `child:blocker` pairs wiring `blocked-by` edges between adopted shards.
    #[arg(long = "order", value_parser = parse_order_pair)]
    pub order: Vec<(String, String)>,
}

fn parse_order_pair(s: &str) -> Result<(String, String), String> {
    let (child, blocker) = s.split_once(':').ok_or_else(|| format!("expected CHILD:BLOCKER, got '{s}'"))?;
    Ok((child.to_string(), blocker.to_string()))
}

#[derive(Args, Debug)]
pub struct EpicShowArgs {
    pub id: String,
    /// Show direct children and aggregate progress alongside the epic.
    #[arg(long)]
    pub detail: bool,
}

// ---------------------------------------------------------------------------
// focus
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct FocusArgs {
    #[command(subcommand)]
    pub command: FocusCommands,
}

#[derive(Subcommand, Debug)]
pub enum FocusCommands {
    Show,
    Set(FocusSetArgs),
    Clear,
}

#[derive(Args, Debug)]
pub struct FocusSetArgs {
    pub epic: String,
    #[arg(long)]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// task
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Show a single work item (an alias of `shard show` scoped to the task noun).
    Get(ShardIdArgs),
    /// Assign an open, unblocked item to the acting agent.
    Claim(ShardIdArgs),
    /// Next unblocked work, or an epic's aggregate progress with `--epic`.
    Progress(TaskProgressArgs),
    /// Close a work item.
    Close(ShardCloseArgs),
}

#[derive(Args, Debug)]
pub struct TaskProgressArgs {
    /// Report aggregate progress for this epic instead of listing ready work.
    #[arg(long)]
    pub epic: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// artifact
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ArtifactArgs {
    #[command(subcommand)]
    pub command: ArtifactCommands,
}

#[derive(Subcommand, Debug)]
pub enum ArtifactCommands {
    /// Link an existing shard to a requirement as its artifact.
    Add(ArtifactAddArgs),
}

#[derive(Args, Debug)]
pub struct ArtifactAddArgs {
    pub requirement: String,
    pub artifact: String,
}

// ---------------------------------------------------------------------------
// init / admin / completion
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct InitArgs {
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommands,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Compute and store embeddings for shards that currently lack one.
    EmbedBackfill(EmbedBackfillArgs),
}

#[derive(Args, Debug)]
pub struct EmbedBackfillArgs {
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct CompletionArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
