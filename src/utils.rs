use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use curl::easy::Easy;
use failure::Error;
use failure_derive::Fail;

/// Download a url into a file, creating parent directories as needed.
/// The response body is written verbatim.
pub fn download_to_file(url: &str, location: &Path) -> Result<(), Error> {
    if let Some(parent) = location.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(location)?);
    download(url, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn download<W: Write>(url: &str, output: &mut W) -> Result<(), Error> {
    let mut easy = Easy::new();
    easy.url(url)?;
    easy.fail_on_error(true)?;
    let mut error: Option<io::Error> = None;
    let result = {
        let mut transfer = easy.transfer();
        transfer.write_function(
            |data| if let Err(e) = output.write_all(data) {
                error = Some(e);
                Ok(0)
            } else {
                Ok(data.len())
            },
        )?;
        transfer.perform()
    };
    if easy.response_code()? == 404 {
        return Err(HttpNotFound.into())
    }
    match result {
        Err(e) => {
            if let Some(actual_error) = error.take() {
                Err(actual_error.into())
            } else {
                Err(e.into())
            }
        }
        Ok(_) => {
            assert!(error.is_none());
            Ok(())
        }
    }
}
#[derive(Debug, Fail)]
#[fail(display = "HTTP 404 not found")]
pub struct HttpNotFound;
