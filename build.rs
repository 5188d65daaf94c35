fn main() {
    // Kompilacja plików Slint
    slint_build::compile("ui/appwindow.slint").unwrap();
}
