//! Command line interface and the non-interactive commands.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, info, warn};

use crate::api::{ObjectApi, ObjectStatus};
use crate::comments::{Author, Comment, CommentSet};
use crate::controller::{CommentView, Session, SidebarContent, build_view};
use crate::date::format_relative_date;
use crate::export::{document_html, sanitize_filename, sidebar_html};
use crate::settings;
use crate::view::{DisplayMode, ViewState};

const ANONYMOUS: &str = "Anonymous";

#[derive(Parser, Debug)]
#[command(name = "roundview", version, about = "Review and comment documents from a RoundReview server")]
pub struct Cli {
    /// Server base URL, defaults to `server_url` from the settings file
    #[arg(long, global = true, env = "ROUNDVIEW_SERVER")]
    pub server: Option<String>,

    /// API key sent as `x-api-key`
    #[arg(long, global = true, env = "ROUNDVIEW_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true, default_value = "info")]
    pub log_level: LevelFilter,

    /// Directory holding config.yaml
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a document in the terminal viewer
    View(ViewArgs),
    /// Read and change the comments of a document
    Comments {
        #[command(subcommand)]
        command: CommentsCommand,
    },
    /// Show the review status of a document, or set it
    Status {
        object: String,
        /// One of: no review, pending review, under review, require changes, approved
        value: Option<String>,
    },
    /// List the documents of a project
    Objects { project: String },
    Reviews {
        #[command(subcommand)]
        command: ReviewsCommand,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AuthorArgs {
    #[arg(long)]
    pub author_name: Option<String>,
    #[arg(long)]
    pub author_id: Option<String>,
}

impl AuthorArgs {
    /// Command line values first, then the settings file.
    pub fn resolve(&self) -> Author {
        let (name, id) = settings::get_author();
        Author::new(
            self.author_name
                .clone()
                .or(name)
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            self.author_id.clone().or(id).unwrap_or_default(),
        )
    }
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    pub object: String,
    #[command(flatten)]
    pub author: AuthorArgs,
    /// Allow creating, resolving and deleting comments
    #[arg(long)]
    pub can_comment: bool,
    /// Allow changing the review status
    #[arg(long)]
    pub can_edit: bool,
}

impl ViewArgs {
    pub fn session(&self) -> Session {
        Session {
            author: self.author.resolve(),
            can_comment: self.can_comment,
            can_edit: self.can_edit,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CommentsCommand {
    /// Print the comments of a document
    List {
        object: String,
        /// Only comments of this page
        #[arg(long)]
        page: Option<u32>,
        /// Print sidebar markup instead of text
        #[arg(long)]
        html: bool,
    },
    /// Add a comment at unscaled page coordinates
    Add {
        object: String,
        #[arg(long)]
        page: u32,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        #[arg(long)]
        text: String,
        #[command(flatten)]
        author: AuthorArgs,
    },
    /// Toggle the resolved flag of a comment
    Resolve { object: String, id: String },
    Delete { object: String, id: String },
    /// Write the comments of a document to an HTML file
    Export {
        object: String,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReviewsCommand {
    Delete { id: String },
}

/// Server URL from the command line or the settings file.
pub fn resolve_server(cli_value: Option<&str>) -> Result<String> {
    cli_value
        .map(str::to_string)
        .or_else(settings::get_server_url)
        .ok_or_else(|| anyhow!("No server configured, pass --server or set server_url in the settings file"))
}

pub fn resolve_api_key(cli_value: Option<&str>) -> Option<String> {
    cli_value.map(str::to_string).or_else(settings::get_api_key)
}

/// Comment view of every page, or of `page` only.
fn listing(comments: &[Comment], page: Option<u32>) -> CommentView {
    let mut view = ViewState::new(u32::MAX, false);
    match page {
        Some(page) => view.page = page,
        None => view.mode = DisplayMode::All,
    }
    build_view(comments, &view, &Session::default())
}

fn write_rows(out: &mut dyn Write, content: &SidebarContent) -> Result<()> {
    match content {
        SidebarContent::Rows(rows) => {
            for row in rows {
                let mark = if row.resolved { " [resolved]" } else { "" };
                writeln!(
                    out,
                    "({}) p.{} {} [{}]{mark}",
                    row.number, row.page, row.author_name, row.id
                )?;
                for line in row.text.lines() {
                    writeln!(out, "    {line}")?;
                }
            }
        }
        SidebarContent::Empty => writeln!(out, "No comments.")?,
        SidebarContent::Error(message) => writeln!(out, "{message}")?,
        SidebarContent::Loading => {}
    }
    Ok(())
}

/// Fetches, mutates and replaces the comment collection of `object`.
async fn rewrite<A: ObjectApi>(
    api: &A,
    object: &str,
    mutate: impl FnOnce(&mut CommentSet) -> Result<()>,
) -> Result<()> {
    let mut set = api
        .fetch_comments(object)
        .await
        .with_context(|| format!("Failed to fetch comments of {object}"))?;
    mutate(&mut set)?;
    api.replace_comments(object, &set)
        .await
        .with_context(|| format!("Failed to save comments of {object}"))
}

pub async fn run_comments<A: ObjectApi>(
    api: &A,
    command: CommentsCommand,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        CommentsCommand::List { object, page, html } => {
            let set = api
                .fetch_comments(&object)
                .await
                .with_context(|| format!("Failed to fetch comments of {object}"))?;
            let view = listing(set.as_slice(), page);
            if html {
                writeln!(out, "{}", sidebar_html(&view.sidebar))?;
            } else {
                write_rows(out, &view.sidebar)?;
            }
        }
        CommentsCommand::Add {
            object,
            page,
            x,
            y,
            text,
            author,
        } => {
            if page == 0 {
                bail!("Pages are numbered from 1");
            }
            if text.trim().is_empty() {
                bail!("Comment text is empty");
            }
            let author = author.resolve();
            let mut created = String::new();
            rewrite(api, &object, |set| {
                let id = set.next_id(chrono::Utc::now().timestamp_millis());
                set.add(Comment::at_surface_point(
                    id.clone(),
                    text,
                    (x, y),
                    1.0,
                    page,
                    &author,
                ));
                created = id;
                Ok(())
            })
            .await?;
            info!("Created {created} on {object} page {page}");
            writeln!(out, "{created}")?;
        }
        CommentsCommand::Resolve { object, id } => {
            let mut resolved = false;
            rewrite(api, &object, |set| {
                resolved = set
                    .toggle_resolved(&id)
                    .ok_or_else(|| anyhow!("Comment {id} not found"))?;
                Ok(())
            })
            .await?;
            let state = if resolved { "resolved" } else { "reopened" };
            writeln!(out, "Comment {id} {state}")?;
        }
        CommentsCommand::Delete { object, id } => {
            rewrite(api, &object, |set| {
                set.remove(&id)
                    .map(|_| ())
                    .ok_or_else(|| anyhow!("Comment {id} not found"))
            })
            .await?;
            writeln!(out, "Comment {id} deleted")?;
        }
        CommentsCommand::Export { object, output } => {
            let info = api
                .fetch_object(&object)
                .await
                .with_context(|| format!("Failed to fetch {object}"))?;
            let set = CommentSet::from_value(&info.comments)
                .with_context(|| format!("Malformed comments for {object}"))?;
            let title = if info.name.is_empty() { &object } else { &info.name };
            let view = listing(set.as_slice(), None);
            let path = output
                .unwrap_or_else(|| PathBuf::from(format!("{}.html", sanitize_filename(title))));
            std::fs::write(&path, document_html(title, &view.sidebar))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            writeln!(out, "Exported {} comments to {}", view.count(), path.display())?;
        }
    }
    Ok(())
}

pub async fn run_status<A: ObjectApi>(
    api: &A,
    object: &str,
    value: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    match value {
        None => {
            let info = api
                .fetch_object(object)
                .await
                .with_context(|| format!("Failed to fetch {object}"))?;
            match info.status {
                Some(status) => writeln!(out, "{status}")?,
                None => writeln!(out, "-")?,
            }
        }
        Some(value) => {
            let Some(status) = ObjectStatus::parse(value) else {
                let known: Vec<&str> = ObjectStatus::all().iter().map(|s| s.as_str()).collect();
                bail!("Unknown status '{value}', expected one of: {}", known.join(", "));
            };
            api.set_status(object, status)
                .await
                .with_context(|| format!("Failed to set status of {object}"))?;
            writeln!(out, "{status}")?;
        }
    }
    Ok(())
}

pub async fn run_objects<A: ObjectApi>(api: &A, project: &str, out: &mut dyn Write) -> Result<()> {
    let objects = api
        .list_project_objects(project)
        .await
        .with_context(|| format!("Failed to list objects of project {project}"))?;
    for object in objects {
        let status = object.status.map(|s| s.as_str()).unwrap_or("-");
        let updated = object
            .update_date
            .as_deref()
            .map(format_relative_date)
            .unwrap_or_default();
        writeln!(out, "{}\t{}\t{status}\t{updated}", object.id, object.name)?;
    }
    Ok(())
}

/// Fire-and-forget: a failure is logged and not reported.
pub async fn run_reviews<A: ObjectApi>(api: &A, command: ReviewsCommand) {
    match command {
        ReviewsCommand::Delete { id } => {
            if let Err(e) = api.delete_review(&id).await {
                warn!("Failed to delete review {id}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MemoryObjectApi};

    fn comment(id: &str, page: u32) -> Comment {
        Comment {
            id: id.to_string(),
            text: format!("note {id}"),
            x: 10.0,
            y: 20.0,
            page,
            author_name: "Ada".to_string(),
            author_id: "1".to_string(),
            resolved: false,
        }
    }

    fn api() -> MemoryObjectApi {
        let api = MemoryObjectApi::new();
        api.insert_object("obj", "Design", vec![comment("a", 1), comment("b", 2)]);
        api
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "roundview",
            "--server",
            "http://localhost:8080",
            "comments",
            "list",
            "obj",
            "--page",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://localhost:8080"));
        assert_eq!(cli.log_level, LevelFilter::Info);
        match cli.command {
            Command::Comments {
                command: CommentsCommand::List { object, page, html },
            } => {
                assert_eq!(object, "obj");
                assert_eq!(page, Some(2));
                assert!(!html);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn view_flags_build_the_session() {
        let cli = Cli::try_parse_from([
            "roundview",
            "view",
            "obj",
            "--author-name",
            "Grace",
            "--author-id",
            "9",
            "--can-comment",
        ])
        .unwrap();
        let Command::View(args) = cli.command else {
            panic!("expected view");
        };
        let session = args.session();
        assert_eq!(session.author, Author::new("Grace", "9"));
        assert!(session.can_comment);
        assert!(!session.can_edit);
    }

    #[tokio::test]
    async fn lists_one_page() {
        let api = api();
        let mut out = Vec::new();
        let cmd = CommentsCommand::List {
            object: "obj".into(),
            page: Some(2),
            html: false,
        };
        run_comments(&api, cmd, &mut out).await.unwrap();
        let text = output(out);
        assert!(text.contains("(1) p.2 Ada [b]"));
        assert!(!text.contains("[a]"));
    }

    #[tokio::test]
    async fn add_stores_unscaled_coordinates() {
        let api = api();
        let mut out = Vec::new();
        let cmd = CommentsCommand::Add {
            object: "obj".into(),
            page: 3,
            x: 40.0,
            y: 50.0,
            text: "check this".into(),
            author: AuthorArgs {
                author_name: Some("Grace".into()),
                author_id: Some("9".into()),
            },
        };
        run_comments(&api, cmd, &mut out).await.unwrap();

        let id = output(out).trim().to_string();
        let stored = api.comments("obj");
        let created = stored.get(&id).unwrap();
        assert_eq!((created.x, created.y, created.page), (40.0, 50.0, 3));
        assert_eq!(created.author_name, "Grace");
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn resolve_and_delete_report_unknown_ids() {
        let api = api();
        let mut out = Vec::new();
        let resolve = CommentsCommand::Resolve {
            object: "obj".into(),
            id: "a".into(),
        };
        run_comments(&api, resolve, &mut out).await.unwrap();
        assert!(api.comments("obj").get("a").unwrap().resolved);

        let missing = CommentsCommand::Delete {
            object: "obj".into(),
            id: "zzz".into(),
        };
        let err = run_comments(&api, missing, &mut out).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert_eq!(api.comments("obj").len(), 2);
    }

    #[tokio::test]
    async fn export_writes_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        let api = api();
        let mut out = Vec::new();
        let cmd = CommentsCommand::Export {
            object: "obj".into(),
            output: Some(path.clone()),
        };
        run_comments(&api, cmd, &mut out).await.unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<h1>Design</h1>"));
        assert!(html.contains("id='b'"));
        assert!(output(out).starts_with("Exported 2 comments"));
    }

    #[tokio::test]
    async fn status_rejects_unknown_values() {
        let api = api();
        let mut out = Vec::new();
        assert!(run_status(&api, "obj", Some("done"), &mut out).await.is_err());

        run_status(&api, "obj", Some("approved"), &mut out).await.unwrap();
        assert_eq!(api.status("obj"), Some(ObjectStatus::Approved));
    }

    #[tokio::test]
    async fn review_deletion_swallows_errors() {
        let api = api();
        api.fail_next_write(ApiError::status(500));
        run_reviews(&api, ReviewsCommand::Delete { id: "r1".into() }).await;
        run_reviews(&api, ReviewsCommand::Delete { id: "r2".into() }).await;
        assert_eq!(api.deleted_reviews(), vec!["r2".to_string()]);
    }
}
