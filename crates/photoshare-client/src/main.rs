use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use tracing::debug;

use photoshare_backend::{BackendConfig, LocalBackend};
use photoshare_client::controllers::comments::CommentThreadController;
use photoshare_client::controllers::detail::PhotoDetailController;
use photoshare_client::controllers::gallery::GalleryController;
use photoshare_client::controllers::signin::SignInController;
use photoshare_client::controllers::signup::SignUpController;
use photoshare_client::controllers::upload::{content_type_for, UploadController, UploadForm};
use photoshare_client::routes::{guard, Guard, Route};
use photoshare_client::session_file::SessionFile;
use photoshare_client::view::Notice;
use photoshare_client::AppContext;
use photoshare_shared::{CommentId, PhotoId, Session};

#[derive(Parser, Debug)]
#[command(name = "photoshare", about = "Share photos and comment on them", version)]
struct Cli {
    /// Directory holding the local backend's database and objects
    #[arg(long, global = true, env = "PHOTOSHARE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account; a confirmation code is sent to the email
    SignUp { email: String, password: String },
    /// Confirm an account with the emailed code
    Confirm {
        email: String,
        code: String,
        /// Sign in straight away with this password
        #[arg(long)]
        password: Option<String>,
    },
    SignIn { email: String, password: String },
    SignOut,
    /// Show who is signed in
    Whoami,
    /// List every photo, newest first
    Gallery,
    /// Upload an image file
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show a photo and its comments
    Show { photo_id: PhotoId },
    Comment { photo_id: PhotoId, text: String },
    DeletePhoto { photo_id: PhotoId },
    DeleteComment {
        photo_id: PhotoId,
        comment_id: CommentId,
    },
    /// Save a photo's image bytes to disk
    Download {
        photo_id: PhotoId,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Command {
    /// Page the command acts on, for the route guard.
    fn route(&self) -> Route {
        match self {
            Command::SignUp { .. } | Command::Confirm { .. } => Route::SignUp,
            Command::SignIn { .. } | Command::SignOut | Command::Whoami => Route::SignIn,
            Command::Gallery | Command::Upload { .. } => Route::Gallery,
            Command::Show { photo_id }
            | Command::Comment { photo_id, .. }
            | Command::DeletePhoto { photo_id }
            | Command::DeleteComment { photo_id, .. }
            | Command::Download { photo_id, .. } => Route::Photo(*photo_id),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    photoshare_client::init_tracing();
    let cli = Cli::parse();

    let mut config = BackendConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    debug!(?config, "Opening local backend");

    let backend = LocalBackend::open(&config)
        .await
        .context("failed to open the local backend")?;
    let mut ctx = AppContext::new(backend.backend());
    let session_file = SessionFile::in_dir(&config.data_dir);

    session_file.restore(&mut ctx.session).await;

    let route = cli.command.route();
    match cli.command {
        Command::SignUp { email, password } => {
            let mut form = SignUpController::new();
            if form.submit(&mut ctx.session, &email, &password).await {
                println!("Confirmation code sent. Run `photoshare confirm {email} <CODE>`.");
            } else {
                fail(form.take_notice())?;
            }
        }
        Command::Confirm {
            email,
            code,
            password,
        } => {
            let mut form = SignUpController::resume(email, password);
            let session = form.confirm(&mut ctx.session, &code).await;
            if let Some(notice) = form.take_notice() {
                bail!("{notice}");
            }
            match session {
                Some(session) => {
                    session_file.save(&session).await?;
                    println!("Account confirmed. Signed in as {}.", session.login_id);
                }
                None => println!("Account confirmed. Run `photoshare sign-in` to continue."),
            }
        }
        Command::SignIn { email, password } => {
            let mut form = SignInController::new();
            match form.submit(&mut ctx.session, &email, &password).await {
                Some(session) => {
                    session_file.save(&session).await?;
                    println!("Signed in as {}.", session.login_id);
                }
                None => fail(form.take_notice())?,
            }
        }
        Command::SignOut => {
            let result = ctx.session.sign_out().await;
            session_file.clear().await?;
            result?;
            println!("Signed out.");
        }
        Command::Whoami => match ctx.session.current_session().await? {
            Some(session) => println!("{} ({})", session.login_id, session.user_id),
            None => println!("Not signed in."),
        },
        Command::Gallery => {
            let session = require_session(&mut ctx, route).await?;
            let mut gallery = GalleryController::new(&ctx, session);
            gallery.load().await;
            if let Some(notice) = gallery.take_notice() {
                bail!("{notice}");
            }
            if gallery.photos().is_empty() {
                println!("No photos yet.");
            }
            for photo in gallery.photos() {
                let mine = if gallery.is_owner(photo) { " *" } else { "" };
                println!(
                    "{}  {}  {}{}",
                    photo.id,
                    photo.uploaded_at.format("%Y-%m-%d %H:%M"),
                    photo.title,
                    mine
                );
            }
        }
        Command::Upload {
            file,
            title,
            description,
        } => {
            let session = require_session(&mut ctx, route).await?;
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();

            let mut upload = UploadController::new(&ctx, session);
            let form = UploadForm {
                title,
                description,
                file_name,
                content_type: content_type_for(&file),
                bytes: Bytes::from(bytes),
            };
            match upload.submit(form).await {
                Some(photo) => println!("Uploaded {} ({}).", photo.title, photo.id),
                None => fail(upload.take_notice())?,
            }
        }
        Command::Show { photo_id } => {
            let session = require_session(&mut ctx, route).await?;
            let mut detail = PhotoDetailController::new(&ctx, session.clone(), photo_id);
            detail.load().await;
            let Some(photo) = detail.photo() else {
                fail(detail.take_notice())?;
                return Ok(());
            };

            println!("{}", photo.title);
            if let Some(description) = &photo.description {
                println!("{description}");
            }
            println!("Uploaded {}", photo.uploaded_at.format("%Y-%m-%d %H:%M"));
            match detail.image_url() {
                Some(url) => println!("Image: {}", url.url),
                None => println!("Image: unavailable"),
            }

            let mut thread = CommentThreadController::new(&ctx, session, photo_id);
            thread.load().await;
            if let Some(notice) = thread.take_notice() {
                eprintln!("{notice}");
            }
            println!("\nComments ({}):", thread.comments().len());
            for comment in thread.comments() {
                println!(
                    "  [{}] {} at {}: {}",
                    comment.id,
                    comment.username,
                    comment.created_at.format("%Y-%m-%d %H:%M"),
                    comment.content
                );
            }
        }
        Command::Comment { photo_id, text } => {
            let session = require_session(&mut ctx, route).await?;
            let mut thread = CommentThreadController::new(&ctx, session, photo_id);
            thread.set_draft(text);
            if thread.post().await {
                println!("Comment posted.");
            } else {
                fail(thread.take_notice())?;
            }
        }
        Command::DeletePhoto { photo_id } => {
            let session = require_session(&mut ctx, route).await?;
            let mut detail = PhotoDetailController::new(&ctx, session, photo_id);
            detail.load().await;
            if detail.photo().is_none() || !detail.delete().await {
                fail(detail.take_notice())?;
            }
            println!("Photo deleted.");
        }
        Command::DeleteComment {
            photo_id,
            comment_id,
        } => {
            let session = require_session(&mut ctx, route).await?;
            let mut thread = CommentThreadController::new(&ctx, session, photo_id);
            if thread.delete(comment_id).await {
                println!("Comment deleted.");
            } else {
                fail(thread.take_notice())?;
            }
        }
        Command::Download { photo_id, output } => {
            let session = require_session(&mut ctx, route).await?;
            let mut detail = PhotoDetailController::new(&ctx, session, photo_id);
            detail.load().await;
            let Some(photo) = detail.photo() else {
                fail(detail.take_notice())?;
                return Ok(());
            };
            let url = detail
                .image_url()
                .ok_or_else(|| anyhow!("no image stored for this photo"))?;

            let body = ctx.storage.download(url).await?;
            let output = output.unwrap_or_else(|| default_output(&photo.s3_key));
            tokio::fs::write(&output, &body.bytes)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!(
                "Saved {} bytes ({}) to {}.",
                body.bytes.len(),
                body.content_type,
                output.display()
            );
        }
    }

    Ok(())
}

/// The session for a protected page, or an error telling the user to sign in.
async fn require_session(ctx: &mut AppContext, route: Route) -> anyhow::Result<Session> {
    match guard(&mut ctx.session, route).await {
        Guard::Proceed(session) => Ok(session),
        Guard::Redirect(to) => bail!("Not signed in; run `photoshare sign-in` first (redirected to {to})"),
        Guard::Open => bail!("{route} does not require a session"),
    }
}

fn fail(notice: Option<Notice>) -> anyhow::Result<()> {
    match notice {
        Some(notice) => bail!("{notice}"),
        None => bail!("request failed"),
    }
}

fn default_output(s3_key: &str) -> PathBuf {
    let name = Path::new(s3_key)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo");
    PathBuf::from(name)
}
