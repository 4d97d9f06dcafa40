//! Keygen command implementation

use crate::crypto::generate_identity;
use crate::error::Result;

/// Run keygen command
///
/// Prints the recipient as a comment followed by the identity, so the output can be stored
/// as a key file and the recipient shared with `banana build -r`.
pub fn run() -> Result<()> {
    print!("{}", render_keypair());
    Ok(())
}

fn render_keypair() -> String {
    let (identity, recipient) = generate_identity();
    format!(
        "# recipient: {}\n{}\n",
        recipient.to_base64(),
        identity.to_base64()
    )
}
