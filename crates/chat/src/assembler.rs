use shion_common::{Part, UploadedFile};

/// Leading fragment that tells the model who is speaking.
///
/// All human speakers share the `user` role, so the tag is what lets one
/// history distinguish them.
pub fn identity_tag(speaker_id: &str, display_name: &str) -> String {
    format!("user(name={display_name}, id={speaker_id})")
}

/// Build the parts of one turn: identity tag, then the text when non-empty,
/// then one file reference per uploaded file, in upload order.
pub fn assemble(
    speaker_id: &str,
    display_name: &str,
    text: &str,
    files: &[UploadedFile],
) -> Vec<Part> {
    let mut parts = Vec::with_capacity(2 + files.len());
    parts.push(Part::text(identity_tag(speaker_id, display_name)));
    if !text.is_empty() {
        parts.push(Part::text(text));
    }
    parts.extend(files.iter().map(Part::file));
    parts
}
