/// Contains everything needed to handle coordinates.
pub mod coordinates;
/// Feature geometries.
pub mod geometry;
/// Stuff to be send to the map view.
pub mod map_event;
/// The map view the locator controls.
pub mod view;
