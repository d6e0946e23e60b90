use super::*;
use pretty_assertions::assert_eq;

#[test]
fn buffer_collects_print_and_println() {
    let handler = buffer_handler();
    handler.print("a");
    handler.print("b");
    handler.println("c");
    handler.println("");
    assert_eq!(handler.output(), "abc\n\n");
}

#[test]
fn buffer_clear_resets_output() {
    let handler = buffer_handler();
    handler.println("first");
    handler.clear();
    handler.print("second");
    assert_eq!(handler.output(), "second");
}

#[test]
fn silent_and_stdout_capture_nothing() {
    let silent = silent_handler();
    silent.println("dropped");
    assert_eq!(silent.output(), "");
    assert_eq!(stdout_handler().output(), "");
}

#[test]
fn shared_handle_sees_same_buffer() {
    let handler = buffer_handler();
    let host_view = Arc::clone(&handler);
    handler.print("shared");
    assert_eq!(host_view.output(), "shared");
}
