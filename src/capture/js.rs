//! JavaScript snippets evaluated in the page during capture.

/// True once the document is fully loaded and every image has settled.
pub const QUIESCENCE_CHECK: &str = r"
(() => {
  if (document.readyState !== 'complete') return false;
  return Array.from(document.images).every((img) => img.complete);
})()
";

/// Synthetic scroll through the page to trigger lazy-loading observers,
/// then back to the top.
pub fn scroll_script(steps: u32, step_px: u32, pause_ms: u64) -> String {
    format!(
        r"
(async () => {{
  const pause = (ms) => new Promise((resolve) => setTimeout(resolve, ms));
  for (let i = 0; i < {steps}; i++) {{
    window.scrollBy(0, {step_px});
    await pause({pause_ms});
  }}
  window.scrollTo(0, 0);
}})()
"
    )
}
