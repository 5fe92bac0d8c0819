//! Terminal presentation of results and alerts.

use lifemix_core::result::{DownloadState, SongResult};

/// Result panel shown after a successful submission.
pub fn result_panel(result: &SongResult) -> String {
    let underline = "=".repeat(result.title.chars().count().max(1));
    format!(
        "{title}\n{underline}\n\
         Genre Tags: {tags}\n\
         BPM: {bpm}\n\
         Language: {language}\n\
         Singer: {singer}\n\
         \n\
         Lyrics:\n\
         {lyrics}\n\
         \n\
         Preview: {preview}",
        title = result.title,
        tags = result.genre_tags.join(", "),
        bpm = result.tempo,
        language = result.language,
        singer = result.voice_type,
        lyrics = result.lyrics,
        preview = result.preview_audio_url,
    )
}

/// Alert shown when a submission fails.
pub fn error_alert(message: &str) -> String {
    format!("Error: {message}")
}

/// Status line for the download button.
pub fn download_line(download: &DownloadState) -> String {
    match (download.ready, download.final_audio_url.as_deref()) {
        (true, Some(url)) => format!("Download Audio: {url}"),
        _ => "Preparing Download...".to_string(),
    }
}
