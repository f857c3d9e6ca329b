//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# Site
title: Coursebook
description: Lessons on testing and editor workflows
author: ''
language: en

# URL
url: http://localhost:4000
root: /
edit_url: https://github.com/coursebook/coursebook/edit/main/content/:path

# Directory
content_dir: content
public_dir: public
static_dir: static

# Writing
render_drafts: false
date_format: '%B %-d, %Y'
highlight:
  enable: true
  line_number: false
  theme: base16-ocean.dark
"#;

const WELCOME_LESSON: &str = r#"---
title: Welcome
description: How this site is organized
---

# Welcome

Every file in `content/` is one lesson, served at `/<file name>`.
"#;

const STYLESHEET: &str = include_str!("../../static/style.css");

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("content"))?;
    fs::create_dir_all(target_dir.join("static"))?;

    write_if_missing(&target_dir.join(crate::CONFIG_FILE), CONFIG_TEMPLATE)?;
    write_if_missing(&target_dir.join("content/welcome.md"), WELCOME_LESSON)?;
    write_if_missing(&target_dir.join("static/style.css"), STYLESHEET)?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::info!("Keeping existing {:?}", path);
    } else {
        fs::write(path, content)?;
        tracing::debug!("Created {:?}", path);
    }
    Ok(())
}
