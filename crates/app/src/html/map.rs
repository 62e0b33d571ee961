//! Map page that locates the visitor and plots the nearest trees.
//!
//! `{{NEAREST_ENDPOINT}}` and `{{MAP_LIMIT}}` are substituted once at startup
//! by [`render_map_page`](super::render_map_page).

pub const MAP_PAGE_TEMPLATE: &str = r#"
<!doctype html>
<html lang="en" class="h-full">

<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Nearby Trees</title>

  <style type="text/tailwindcss">
    @theme {
      --color-canopy-bg: #0b1410;
      --color-canopy-panel: #13241c;
      --color-canopy-accent: #4ade80;
      --color-canopy-closest: #facc15;
      --color-canopy-user: #38bdf8;
      --color-canopy-danger: #fb7185;
    }

    @layer base {
      html { @apply h-full; }
      body { @apply h-full bg-canopy-bg text-slate-100 font-sans; }
      [x-cloak] { display: none !important; }
      #map { @apply absolute inset-0 z-0 h-full w-full; }
    }

    @layer components {
      .user-marker {
        width: 18px;
        height: 18px;
        border-radius: 50%;
        background: rgba(56, 189, 248, 0.95);
        border: 3px solid #f8fafc;
        box-shadow: 0 0 0 4px rgba(56, 189, 248, 0.35), 0 0 14px rgba(56, 189, 248, 0.6);
      }

      .tree-marker {
        width: 14px;
        height: 14px;
        border-radius: 50%;
        background: rgba(74, 222, 128, 0.9);
        border: 2px solid rgba(11, 20, 16, 0.85);
      }

      .tree-marker.closest {
        width: 22px;
        height: 22px;
        background: rgba(250, 204, 21, 0.95);
        border-color: #f8fafc;
        box-shadow: 0 0 12px rgba(250, 204, 21, 0.65);
      }
    }
  </style>
  <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>

  <!-- Leaflet 1.9.4 -->
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css" crossorigin="anonymous"
    referrerpolicy="no-referrer" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js" crossorigin="anonymous"
    referrerpolicy="no-referrer"></script>

  <script defer src="https://cdn.jsdelivr.net/npm/alpinejs@3.13.5/dist/cdn.min.js" crossorigin="anonymous"></script>
</head>

<body x-data="treeMap()" class="h-full">
  <div id="map"></div>

  <section class="absolute left-3 top-3 z-[500] w-[min(360px,calc(100vw-1.5rem))] rounded-2xl border border-white/10 bg-canopy-panel/95 p-4 shadow-xl">
    <header class="flex items-center justify-between gap-3">
      <h1 class="text-lg font-semibold text-canopy-accent">Nearby trees</h1>
      <button type="button" id="locate"
        class="rounded-lg bg-canopy-accent px-3 py-1.5 text-sm font-semibold text-canopy-bg disabled:cursor-not-allowed disabled:opacity-50"
        :disabled="loading" @click="locate()">
        <span x-show="!loading">Find trees</span>
        <span x-show="loading" x-cloak>Loading…</span>
      </button>
    </header>

    <p x-show="loading" x-cloak class="mt-3 text-sm text-slate-300">Locating you and searching for trees…</p>

    <p x-show="error" x-cloak x-text="error" role="alert" class="mt-3 rounded-lg bg-canopy-danger/15 px-3 py-2 text-sm text-canopy-danger"></p>

    <p x-show="notice" x-cloak x-text="notice" class="mt-3 text-sm text-slate-300"></p>

    <template x-if="location">
      <p class="mt-3 text-xs text-slate-400">
        You are at
        <span x-text="location.lat.toFixed(5)"></span>,
        <span x-text="location.lng.toFixed(5)"></span>
        <template x-if="location.accuracy">
          <span>(±<span x-text="Math.round(location.accuracy)"></span> m)</span>
        </template>
      </p>
    </template>

    <template x-if="closest">
      <div class="mt-3 rounded-lg border border-canopy-closest/40 bg-canopy-closest/10 px-3 py-2 text-sm">
        <p class="font-semibold text-canopy-closest">Closest tree</p>
        <p x-text="closest.boomsoort || 'Unknown species'"></p>
        <p class="text-slate-300">
          <span x-text="closest.distance"></span> m away
          <template x-if="closest.boomhoogte">
            <span>· height <span x-text="closest.boomhoogte"></span></span>
          </template>
        </p>
      </div>
    </template>

    <p x-show="trees.length > 1" x-cloak class="mt-2 text-xs text-slate-400">
      Showing <span x-text="trees.length"></span> trees.
    </p>
  </section>

  <script>
    const NEAREST_ENDPOINT = '{{NEAREST_ENDPOINT}}';
    const MAP_LIMIT = {{MAP_LIMIT}};
    const FIT_PADDING = [40, 40];

    const LOCATION_MESSAGES = {
      1: 'Location access was denied. Allow location access and try again.',
      2: 'Your location is currently unavailable.',
      3: 'Location request timed out.'
    };

    function locationErrorMessage(error) {
      return LOCATION_MESSAGES[error && error.code] || 'Unable to determine your location.';
    }

    function treeMap() {
      return {
        map: null,
        userMarker: null,
        treeLayer: null,

        location: null,
        trees: [],
        closest: null,
        loading: false,
        error: null,
        notice: null,

        init() {
          this.map = L.map('map', {center: [52.3676, 4.9041], zoom: 13, zoomControl: false});
          L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
            maxZoom: 19,
            attribution: '&copy; OpenStreetMap contributors'
          }).addTo(this.map);
          L.control.zoom({position: 'bottomright'}).addTo(this.map);
          L.control.scale({metric: true, imperial: false, position: 'bottomleft'}).addTo(this.map);

          this.treeLayer = L.featureGroup().addTo(this.map);
          this.locate();
        },

        async locate() {
          if (this.loading) return;
          this.loading = true;
          this.error = null;
          this.notice = null;
          try {
            const position = await this.currentPosition();
            this.setLocation(position.coords);
            await this.fetchTrees(this.location.lat, this.location.lng);
          } catch (error) {
            this.error = error && error.userMessage ? error.userMessage : 'Failed to load nearby trees.';
            if (!(error && error.userMessage)) console.error('Nearby trees request failed', error);
          } finally {
            this.loading = false;
          }
        },

        currentPosition() {
          return new Promise((resolve, reject) => {
            if (!navigator.geolocation) {
              reject({userMessage: 'Geolocation is not supported by this browser.'});
              return;
            }
            navigator.geolocation.getCurrentPosition(
              resolve,
              (error) => reject({userMessage: locationErrorMessage(error)}),
              {enableHighAccuracy: true, timeout: 10000, maximumAge: 60000}
            );
          });
        },

        setLocation(coords) {
          const moved = !this.location
            || this.location.lat !== coords.latitude
            || this.location.lng !== coords.longitude;
          this.location = {lat: coords.latitude, lng: coords.longitude, accuracy: coords.accuracy};
          if (!moved) return;

          const latLng = [coords.latitude, coords.longitude];
          if (this.userMarker) {
            this.userMarker.setLatLng(latLng);
          } else {
            this.userMarker = L.marker(latLng, {
              icon: L.divIcon({className: '', html: '<div class="user-marker"></div>', iconSize: [18, 18]}),
              zIndexOffset: 1000,
              title: 'You are here'
            }).bindPopup('You are here').addTo(this.map);
          }
        },

        async fetchTrees(lat, lng) {
          const params = new URLSearchParams({lat: String(lat), lng: String(lng), limit: String(MAP_LIMIT)});
          const response = await fetch(`${NEAREST_ENDPOINT}?${params}`, {headers: {Accept: 'application/json'}});
          const data = await response.json();
          if (!response.ok) {
            throw {userMessage: data && data.error ? data.error : 'Failed to load nearby trees.'};
          }

          if (!data.trees) {
            this.trees = [];
            this.closest = null;
            this.notice = data.message || 'No trees found nearby.';
            this.renderTrees();
            return;
          }

          this.trees = data.trees;
          this.closest = data.closest;
          this.renderTrees();
        },

        renderTrees() {
          this.treeLayer.clearLayers();

          this.trees.forEach((tree, index) => {
            const isClosest = index === 0;
            const [lng, lat] = tree.coordinates;
            const popup = `<strong>${escapeHtml(tree.boomsoort || 'Unknown species')}</strong><br>`
              + (tree.boomhoogte ? `Height: ${escapeHtml(tree.boomhoogte)}<br>` : '')
              + `${tree.distance} m away`;
            L.marker([lat, lng], {
              icon: L.divIcon({
                className: '',
                html: `<div class="tree-marker${isClosest ? ' closest' : ''}"></div>`,
                iconSize: isClosest ? [22, 22] : [14, 14]
              }),
              zIndexOffset: isClosest ? 500 : 0,
              title: tree.boomsoort || `Tree ${tree.id}`
            }).bindPopup(popup).addTo(this.treeLayer);
          });

          this.fitToMarkers();
        },

        fitToMarkers() {
          const bounds = L.latLngBounds([]);
          if (this.userMarker) bounds.extend(this.userMarker.getLatLng());
          this.treeLayer.eachLayer((layer) => bounds.extend(layer.getLatLng()));
          if (bounds.isValid()) {
            this.map.fitBounds(bounds, {padding: FIT_PADDING, maxZoom: 19});
          }
        }
      };
    }

    function escapeHtml(value) {
      return String(value)
        .replace(/&/g, '&amp;')
        .replace(/</g, '&lt;')
        .replace(/>/g, '&gt;')
        .replace(/"/g, '&quot;')
        .replace(/'/g, '&#39;');
    }
  </script>
</body>

</html>
"#;
