// SPDX-License-Identifier: MPL-2.0

use gst::glib;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing elements:{0}")]
    MissingElements(String),

    #[error("Failed to parse pipeline description: {0}")]
    Parse(#[from] glib::Error),

    #[error("{0}")]
    Bool(#[from] glib::BoolError),

    #[error("Failed to link pads: {0:?}")]
    Link(#[from] gst::PadLinkError),

    #[error("No element named '{0}' in the pipeline")]
    NoSuchElement(&'static str),
}

/// Returns an error listing every factory in `factories` that isn't
/// available in the registry.
pub fn check_elements<'a>(factories: impl IntoIterator<Item = &'a str>) -> Result<(), Error> {
    let mut missing_elements = String::new();
    for factory in factories {
        if gst::ElementFactory::find(factory).is_none() {
            missing_elements.push_str("\n\t- ");
            missing_elements.push_str(factory);
        }
    }

    if !missing_elements.is_empty() {
        return Err(Error::MissingElements(missing_elements));
    }

    Ok(())
}
