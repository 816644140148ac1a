fn main() {
    uniffi::generate_scaffolding("src/zoom_bridge.udl").unwrap();
}
