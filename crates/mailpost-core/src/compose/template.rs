//! The fixed HTML view generated for every message.

const HEAD: &str = r#"<html>
  <head>
    <style>
      body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
      .container { max-width: 600px; margin: 0 auto; padding: 20px; }
      .header { background: #4CAF50; color: white; padding: 15px; text-align: center; }
      .content { padding: 20px; background: #f9f9f9; }
      .footer { text-align: center; padding: 10px; font-size: 12px; color: #666; }
    </style>
  </head>
  <body>
    <div class="container">
      <div class="header">
        <h2>📧 SMTP Protocol Email</h2>
      </div>
      <div class="content">
"#;

const TAIL: &str = r#"
      </div>
      <div class="footer">
        <p>This email was sent using <b>mailpost</b></p>
        <p>Computer Networks Mini-Project | SMTP Demonstration</p>
      </div>
    </div>
  </body>
</html>
"#;

/// Renders the HTML alternative of a plain text body.
///
/// Every `\n` becomes `<br>`; nothing else about the body changes.
#[must_use]
pub fn html_body(plain: &str) -> String {
    let content = plain.replace('\n', "<br>");
    let mut html = String::with_capacity(HEAD.len() + content.len() + TAIL.len());
    html.push_str(HEAD);
    html.push_str(&content);
    html.push_str(TAIL);
    html
}
