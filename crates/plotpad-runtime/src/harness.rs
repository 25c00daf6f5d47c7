//! Guest-side execution harness.
//!
//! A fixed Python script written into every run's scratch directory and used
//! as the WASI entry point. It prepares the guest environment, runs the user
//! source, and reports everything back through the scratch directory.

/// Python harness source.
///
/// Executed in the guest for every run. It:
/// - redirects stdout and stderr into one in-memory sink, restoring the
///   originals when the run settles;
/// - forces the non-interactive Agg backend before pyplot loads, then
///   rebinds `pyplot.show` to serialize every open figure to a base64 PNG
///   data URI, emit it to the host, and close it;
/// - registers the emission hook in `builtins` so guest code can reach it
///   without imports;
/// - executes the user source verbatim, then flushes figures that were never
///   explicitly shown;
/// - on an uncaught exception, writes the full traceback as a structured
///   error report and exits nonzero.
pub(crate) const HARNESS_PY: &str = r#"
"""plotpad execution harness.

Runs one user script with stdout/stderr captured into memory and every
matplotlib figure routed back to the host as an encoded image.
"""

import base64
import builtins
import io
import json
import sys
import traceback

SOURCE_PATH = "work/source.py"
TEXT_PATH = "work/stdout.txt"
FIGURES_PATH = "work/figures.ndjson"
ERROR_PATH = "work/error.json"


def _emit_figure(payload):
    """Hand one encoded figure to the host, preserving emission order."""
    with open(FIGURES_PATH, "a") as figures:
        figures.write(json.dumps(payload))
        figures.write("\n")


def _encode_figure(figure):
    buffer = io.BytesIO()
    figure.savefig(buffer, format="png")
    data = base64.b64encode(buffer.getvalue()).decode("ascii")
    return "data:image/png;base64," + data


def _install_plot_capture():
    import matplotlib

    matplotlib.use("Agg")
    import matplotlib.pyplot as plt

    def _capture_show(*args, **kwargs):
        for number in plt.get_fignums():
            figure = plt.figure(number)
            _emit_figure(_encode_figure(figure))
            plt.close(figure)

    plt.show = _capture_show
    return plt


def _run():
    captured = io.StringIO()
    original_stdout = sys.stdout
    original_stderr = sys.stderr
    sys.stdout = captured
    sys.stderr = captured
    try:
        plt = _install_plot_capture()
        builtins._emit_figure = _emit_figure
        with open(SOURCE_PATH) as source_file:
            source = source_file.read()
        exec(compile(source, "<input>", "exec"), {"__name__": "__main__"})
        plt.show()
    finally:
        sys.stdout = original_stdout
        sys.stderr = original_stderr
        with open(TEXT_PATH, "w") as text_file:
            text_file.write(captured.getvalue())


if __name__ == "__main__":
    try:
        _run()
    except BaseException:
        with open(ERROR_PATH, "w") as error_file:
            json.dump({"message": traceback.format_exc()}, error_file)
        sys.exit(1)
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol;

    #[test]
    fn test_harness_and_protocol_agree_on_file_names() {
        for name in [
            protocol::SOURCE_FILE,
            protocol::TEXT_FILE,
            protocol::FIGURES_FILE,
            protocol::ERROR_FILE,
        ] {
            let guest_path = format!("\"work/{name}\"");
            assert!(HARNESS_PY.contains(&guest_path), "harness misses {guest_path}");
        }
    }

    #[test]
    fn test_backend_is_selected_before_pyplot_loads() {
        let backend = HARNESS_PY.find("matplotlib.use(\"Agg\")").unwrap();
        let pyplot = HARNESS_PY.find("import matplotlib.pyplot").unwrap();
        assert!(backend < pyplot);
    }

    #[test]
    fn test_streams_are_restored_in_finally() {
        assert!(HARNESS_PY.contains("finally:"));
        assert!(HARNESS_PY.contains("sys.stdout = original_stdout"));
        assert!(HARNESS_PY.contains("sys.stderr = original_stderr"));
    }

    #[test]
    fn test_captured_figures_are_closed_after_emission() {
        assert!(HARNESS_PY.contains("plt.close(figure)"));
    }

    #[test]
    fn test_unshown_figures_are_flushed_after_user_code() {
        let run_user_code = HARNESS_PY.find("exec(compile(source").unwrap();
        let flush = HARNESS_PY.rfind("plt.show()").unwrap();
        assert!(run_user_code < flush);
    }

    #[test]
    fn test_emission_hook_is_registered_in_builtins() {
        assert!(HARNESS_PY.contains("builtins._emit_figure = _emit_figure"));
    }

    #[test]
    fn test_figures_are_emitted_as_png_data_uris() {
        assert!(HARNESS_PY.contains("data:image/png;base64,"));
    }

    #[test]
    fn test_failures_produce_a_traceback_report_and_nonzero_exit() {
        assert!(HARNESS_PY.contains("traceback.format_exc()"));
        assert!(HARNESS_PY.contains("sys.exit(1)"));
    }
}
