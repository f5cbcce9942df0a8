use anyhow::Result;
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated config, cache and working directory for one test.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_home(&self) -> PathBuf {
        self.path().join("config")
    }

    pub fn cache_home(&self) -> PathBuf {
        self.path().join("cache")
    }

    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_sample_report(&self) -> Result<PathBuf> {
        self.write_file("setup.mht", &sample_report())
    }

    /// The sample report as the recorder saves it: a zip holding one .mht.
    pub fn write_sample_archive(&self) -> Result<PathBuf> {
        let path = self.path().join("setup.zip");
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&path)?);
        writer.start_file("Recording_20190102.mht", zip::write::SimpleFileOptions::default())?;
        writer.write_all(sample_report().as_bytes())?;
        writer.finish()?;
        Ok(path)
    }
}

fn png_base64(width: u32, height: u32) -> String {
    let img = DynamicImage::new_rgb8(width, height);
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .expect("encode test png");
    STANDARD.encode(buffer.into_inner())
}

/// A three step recording: 09:00:00 to 09:00:30 with actions at +2s, +10s
/// and +20s. Only the first action carries a screenshot.
pub fn sample_report() -> String {
    let payload = png_base64(64, 64)
        .as_bytes()
        .chunks(76)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\r\n");

    format!(
        "MIME-Version: 1.0\r\n\
Content-Type: multipart/related; boundary=\"=_NextPart_SMP_1\"\r\n\
\r\n\
--=_NextPart_SMP_1\r\n\
Content-Type: text/html\r\n\
Content-Location: main.htm\r\n\
\r\n\
<html><body><div>Recording Session: 1/2/2019 9:00:00 - 9:00:30 \
Step 1: User left click on &quot;OK&quot; (button)<br />Program: Dialog Host<br />UI Elements: OK, Dialog<br />\
Step 2: User keyboard input in &quot;Notepad&quot; [Ctrl-S ...]<br />Program: Notepad<br />UI Elements: Text Editor<br />\
Step 3: User left click on &quot;Close&quot; (button)<br />Program: Notepad<br />UI Elements: Close, Notepad<br />\
</div>\r\n\
<Report><UserActionData><RecordSession StartTime=\"09:00:00\" StopTime=\"09:00:30\" ActionCount=\"3\">\r\n\
<EachAction ActionNumber=\"1\" Time=\"09:00:02\"><HighlightXYWH>10,10,50,50</HighlightXYWH>\
<ScreenshotFileName>screenshot0001.PNG</ScreenshotFileName></EachAction>\r\n\
<EachAction ActionNumber=\"2\" Time=\"09:00:10\"></EachAction>\r\n\
<EachAction ActionNumber=\"3\" Time=\"09:00:20\"></EachAction>\r\n\
</RecordSession></UserActionData></Report>\r\n\
</body></html>\r\n\
\r\n\
--=_NextPart_SMP_1\r\n\
Content-Type: image/png\r\n\
Content-Transfer-Encoding: base64\r\n\
Content-Location: screenshot0001.PNG\r\n\
\r\n\
{payload}\r\n\
\r\n\
--=_NextPart_SMP_1--\r\n"
    )
}
