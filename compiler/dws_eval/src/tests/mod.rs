//! Test modules for evaluator components without their own sibling file.
