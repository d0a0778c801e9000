use catalog::{
    BoundingBox, CatalogRecord, InMemoryCatalogStore, LayerModel, OnlineResource, ResourceKind,
};
use foundation::bounds::Extent;
use foundation::math::{Srs, Vec2, lon_lat_to_mercator, transform_extent};
use foundation::time::Time;
use layers::{Backend, ClickResult, LayerParams, MapConfig, MapView, StatusLog};
use pretty_assertions::assert_eq;
use scene::memory::MemorySurface;
use scene::selection::SelectionPolygon;
use scene::surface::MapSurface;
use scene::view::Viewport;
use std::cell::RefCell;
use std::rc::Rc;

const PORTAL_RECORDS: &str = r#"[
  {
    "id": "gmap-layer-1",
    "name": "Surface geology",
    "description": "1:1M surface geology",
    "geographicElements": [
      {
        "westBoundLongitude": 10,
        "eastBoundLongitude": 20,
        "southBoundLatitude": -10,
        "northBoundLatitude": 10
      }
    ],
    "onlineResources": [
      {"url": "http://example.org/wms", "name": "gml:geology", "type": "WMS", "version": "1.3.0"}
    ]
  },
  {
    "id": "boreholes",
    "name": "Boreholes",
    "geographicElements": [
      {
        "westBoundLongitude": 100,
        "eastBoundLongitude": 120,
        "southBoundLatitude": -40,
        "northBoundLatitude": -20
      }
    ],
    "onlineResources": [
      {"url": "http://example.org/wfs", "name": "gsml:Borehole", "type": "WFS"}
    ]
  }
]"#;

fn map_at(lon: f64, lat: f64) -> MapView<MemorySurface, StatusLog> {
    let center = lon_lat_to_mercator(Vec2::new(lon, lat));
    let surface = MemorySurface::new(Viewport::new(center, 500.0, 300.0, 400.0));
    MapView::new(surface, StatusLog::new(), MapConfig::default()).unwrap()
}

fn layer_from(store: &InMemoryCatalogStore, id: &str) -> LayerModel {
    let record = store.require(id).unwrap();
    LayerModel::new(id, record.name.clone()).with_record(record)
}

#[test]
fn click_in_layer_box_resolves_to_its_render_layers() {
    let store = InMemoryCatalogStore::from_json(PORTAL_RECORDS).unwrap();
    let mut map = map_at(15.0, 0.0);
    assert_eq!(
        map.add_layer(layer_from(&store, "gmap-layer-1"), &LayerParams::new()),
        Ok(Backend::Wms)
    );
    assert_eq!(
        map.add_layer(layer_from(&store, "boreholes"), &LayerParams::new()),
        Ok(Backend::Wfs)
    );

    let published = Rc::new(RefCell::new(Vec::<ClickResult>::new()));
    let sink = Rc::clone(&published);
    map.clicked_stream()
        .subscribe(move |r: &ClickResult| sink.borrow_mut().push(r.clone()));

    let result = map
        .handle_click(Vec2::new(150.0, 200.0), Time(0.0))
        .unwrap()
        .unwrap();
    let expected = map.registry().get_layer_by_id("gmap-layer-1").unwrap().to_vec();
    assert_eq!(result.clicked_layers, expected);
    assert!(result.clicked_features.is_empty());
    assert_eq!(*published.borrow(), vec![result]);
}

#[test]
fn geographic_triangle_is_stored_in_mercator() {
    let mut map = map_at(0.0, 0.0);
    let added = map
        .add_polygon(SelectionPolygon::new("tri", "EPSG:4326", "0,0 10,0 5,10"))
        .unwrap();
    assert!(added);

    let stored = map.clipboard().get("tri").unwrap();
    assert_eq!(stored.srs, "EPSG:3857");
    assert_eq!(stored.vertices().unwrap().len(), 3);
    assert!(stored.render_handle.is_some());
}

#[test]
fn removing_unknown_layer_is_a_noop() {
    let store = InMemoryCatalogStore::from_json(PORTAL_RECORDS).unwrap();
    let mut map = map_at(0.0, 0.0);
    map.add_layer(layer_from(&store, "gmap-layer-1"), &LayerParams::new())
        .unwrap();
    let before = map.surface().attached_layers();
    let events = map.status().events().len();

    assert!(!map.remove_layer("never-added"));
    assert_eq!(map.surface().attached_layers(), before);
    assert_eq!(map.status().events().len(), events);
}

#[test]
fn add_remove_add_starts_fresh() {
    let store = InMemoryCatalogStore::from_json(PORTAL_RECORDS).unwrap();
    let mut map = map_at(0.0, 0.0);
    map.add_layer(layer_from(&store, "gmap-layer-1"), &LayerParams::new())
        .unwrap();
    assert!(map.remove_layer("gmap-layer-1"));
    assert_eq!(map.registry().get_layer_by_id("gmap-layer-1"), None);
    assert!(!map.layer_exists("gmap-layer-1"));

    map.add_layer(layer_from(&store, "gmap-layer-1"), &LayerParams::new())
        .unwrap();
    let handles = map.registry().get_layer_by_id("gmap-layer-1").unwrap();
    assert_eq!(handles.len(), 1);
    assert_eq!(map.surface().attached_layers(), handles.to_vec());
}

#[test]
fn duplicate_polygon_name_keeps_one() {
    let mut map = map_at(0.0, 0.0);
    let sets = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&sets);
    map.clipboard()
        .polygons_stream()
        .subscribe(move |set: &Vec<SelectionPolygon>| sink.borrow_mut().push(set.len()));

    assert!(map
        .add_polygon(SelectionPolygon::new("same", "EPSG:4326", "0,0 10,0 5,10"))
        .unwrap());
    assert!(!map
        .add_polygon(SelectionPolygon::new("same", "EPSG:4326", "1,1 2,1 2,2"))
        .unwrap());
    assert_eq!(map.clipboard().len(), 1);
    assert_eq!(*sets.borrow(), vec![0, 1]);
}

#[test]
fn extent_query_finds_records_of_active_layers() {
    let store = InMemoryCatalogStore::from_json(PORTAL_RECORDS).unwrap();
    let mut map = map_at(0.0, 0.0);
    map.add_layer(layer_from(&store, "gmap-layer-1"), &LayerParams::new())
        .unwrap();
    map.add_layer(layer_from(&store, "boreholes"), &LayerParams::new())
        .unwrap();

    let west_africa =
        transform_extent(Extent::new(0.0, 0.0, 12.0, 5.0), Srs::CATALOGUE, Srs::WORKING);
    let ids: Vec<&str> = map
        .records_in_extent(&west_africa)
        .into_iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(ids, vec!["gmap-layer-1"]);

    let everything =
        transform_extent(Extent::new(-170.0, -60.0, 170.0, 60.0), Srs::CATALOGUE, Srs::WORKING);
    assert_eq!(map.records_in_extent(&everything).len(), 2);
}

#[test]
fn records_missing_service_resources_draw_as_features() {
    let mut map = map_at(15.0, 0.0);
    let record = CatalogRecord::new("plain", "Plain")
        .with_bbox(BoundingBox::new(14.0, 16.0, -1.0, 1.0))
        .with_resource(OnlineResource::new(ResourceKind::Www, "http://example.org/doc", "doc"));
    let model = LayerModel::from_record(record);
    assert_eq!(map.add_layer(model, &LayerParams::new()), Ok(Backend::Www));

    let result = map
        .handle_click(Vec2::new(150.0, 200.0), Time(0.0))
        .unwrap()
        .unwrap();
    assert!(result.clicked_layers.is_empty());
    assert_eq!(result.clicked_features.len(), 1);
    assert_eq!(
        result.clicked_features[0].feature.record_id.as_deref(),
        Some("plain")
    );
}
