use crate::process;
use crate::store::Store;
use reqwest::Client;
use std::sync::Arc;
use teloxide::{
    dispatching::UpdateHandler, net::Download, prelude::*, types::Document,
    utils::command::BotCommands,
};
use tokio::io::AsyncWriteExt;
use tracing::info;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// MIME type Telegram reports for `.xlsx` documents; anything else is ignored.
const SPREADSHEET_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const GREETING: &str = "Привет! Загрузите файл Excel с данными.";
const EMPTY_UPLOAD: &str = "В файле не нашлось ни одной строки с данными.";

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "приветствие и инструкция.")]
    Start,
}

/// The dispatcher tree: commands first, then spreadsheet uploads.
pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.document().map(is_spreadsheet).unwrap_or(false))
                .endpoint(handle_spreadsheet),
        )
}

fn is_spreadsheet(doc: &Document) -> bool {
    doc.mime_type
        .as_ref()
        .map(|mime| mime.essence_str() == SPREADSHEET_MIME)
        .unwrap_or(false)
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> HandlerResult {
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, GREETING).await?;
        }
    }
    Ok(())
}

/// Download the uploaded workbook into a per-chat temporary file, run the
/// pipeline over it, and reply with the per-row report.
///
/// Parse and persistence failures propagate; the dispatcher's error handler
/// logs them and the user gets no reply for that upload.
async fn handle_spreadsheet(
    bot: Bot,
    msg: Message,
    client: Client,
    store: Arc<Store>,
) -> HandlerResult {
    let Some(doc) = msg.document() else {
        return Ok(());
    };

    // unique file per request so concurrent chats cannot clobber each other
    let upload = tempfile::Builder::new()
        .prefix(&format!("upload-{}-", msg.chat.id))
        .suffix(".xlsx")
        .tempfile()?;

    let file = bot.get_file(doc.file.id.clone()).await?;
    let mut dst = tokio::fs::File::from_std(upload.reopen()?);
    bot.download_file(&file.path, &mut dst).await?;
    dst.flush().await?;

    info!(chat = %msg.chat.id, name = ?doc.file_name, "spreadsheet received");
    let report = process::process_batch(&client, &store, upload.path()).await?;

    // Telegram rejects empty message text
    if report.is_empty() {
        bot.send_message(msg.chat.id, EMPTY_UPLOAD).await?;
    } else {
        bot.send_message(msg.chat.id, report).await?;
    }
    Ok(())
}
