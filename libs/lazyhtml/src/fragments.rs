//! Stock fragments for documents.

use crate::based::BasedHtml;
use crate::escape::{escape_json, escape_json_str};
use crate::template::{html, Kind, Template, TemplateBuilder};


/// Viewport meta tag and a script preventing form resubmission on
/// reload.
pub fn common_head() -> BasedHtml {
    BasedHtml::preserialized(r#" <meta
    name="viewport"
    content="width=device-width, initial-scale=1.0"
  />
  <script>
    /* prevent form resubmission */
    if (window.history.replaceState) {
      window.history.replaceState(null, null, window.location.href);
    }
  </script>"#)
}

/// Margin/padding reset and a black background.
pub fn css_reset() -> BasedHtml {
    BasedHtml::preserialized(r#" <style>
  /* CSS Reset */
  * {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
  }

  /* Set the background color to black */
  html,
  body {
    background-color: #000;
    color: #fff; /* Set the default text color to white for better contrast */
  }
</style>"#)
}

/// Client side of the development live reload: reloads the page on
/// any message from `ws://localhost:3001/reload`, reconnecting every
/// second.
pub fn standard_dev_reloader() -> BasedHtml {
    BasedHtml::preserialized(r#"
  <script>
    function reloader() {
      let socket = null;

      function connectWebSocket() {
        if (socket) {
          return;
        }
        socket = new WebSocket("ws://localhost:3001/reload");

        socket.addEventListener("message", (event) => {
          window.location.reload();
        });

        socket.addEventListener("close", (event) => {
          socket = null;
        });

        socket.addEventListener("error", (event) => {
          socket = null;
        });
      }
      connectWebSocket();
      setInterval(connectWebSocket, 1000);
    }
    reloader();
  </script>
"#)
}

/// JSON text that can be put into a `<script>` element: every `<`
/// (which JSON only has inside strings) is written as `\u003c`, so
/// neither `</script>` nor `<!--` can appear in it.
fn script_safe_json(json: String) -> String {
    if json.contains('<') {
        json.replace('<', "\\u003c")
    } else {
        json
    }
}

/// Hand `value` to the frontend as `window[name]`: the JSON is put
/// into a `<script type="application/json">` element and parsed from
/// there.
pub fn deliver<C>(name: &str, value: &serde_json::Value) -> Template<C> {
    let data: Template<C> = TemplateBuilder::new(Kind::DangerJson)
        .literal(&script_safe_json(escape_json(value)))
        .finish();
    // In the attribute the name is html-escaped, in the script it is
    // a JS string literal.
    let js_name = BasedHtml::preserialized(script_safe_json(escape_json_str(name)));
    html(&[" <script type=\"application/json\" id=\"",
           "\">\n        ",
           "\n      </script>\n\n      <script>\n        window[",
           "] = JSON.parse(\n          document.getElementById(",
           ").innerHTML\n        );\n      </script>"],
         vec![name.into(), data.into(), js_name.clone().into(), js_name.into()])
}
