use anyhow::{anyhow, Result};
use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::picture::{Picture, PictureType};
use lofty::probe::read_from_path;
use lofty::tag::{Tag, TagExt};
use std::path::Path;

/// True when the file's tags already carry a picture.
pub fn has_cover(path: &Path) -> Result<bool> {
    let tagged_file = read_from_path(path)?;
    Ok(tagged_file.tags().iter().any(|t| !t.pictures().is_empty()))
}

/// Write `image` as the front cover of the audio file at `path`, replacing
/// any existing front cover in its primary tag.
pub fn embed_cover(path: &Path, image: Vec<u8>) -> Result<()> {
    let mut tagged_file = read_from_path(path)?;

    let mut picture = Picture::from_reader(&mut std::io::Cursor::new(image))
        .map_err(|e| anyhow!("unsupported image data: {}", e))?;
    picture.set_pic_type(PictureType::CoverFront);

    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.primary_tag().is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file
        .primary_tag_mut()
        .ok_or_else(|| anyhow!("no writable tag in {}", path.display()))?;
    tag.remove_picture_type(PictureType::CoverFront);
    tag.push_picture(picture);
    tag.save_to_path(path, WriteOptions::default())?;
    Ok(())
}
