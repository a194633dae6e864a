//! Media type guessing for attachment URLs

pub fn guess_media_type(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next()?;
    let extension = path.rsplit('.').next()?;
    let media_type = match extension.to_lowercase().as_str() {
        "apng" => "image/apng",
        "avif" => "image/avif",
        "gif" => "image/gif",
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "wav" => "audio/wav",
        _ => return None,
    };
    Some(media_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_media_type() {
        let media_type = guess_media_type("https://files.example/media/photo.JPG");
        assert_eq!(media_type, Some("image/jpeg"));
        let media_type = guess_media_type("https://files.example/video.mp4?sig=abc");
        assert_eq!(media_type, Some("video/mp4"));
        let media_type = guess_media_type("https://files.example/file.bin");
        assert_eq!(media_type, None);
    }
}
