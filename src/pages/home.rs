use leptos::ev::MouseEvent;
use leptos::prelude::*;

use crate::components::dependency_graph::{
	DependencyGraph, GraphCommands, GraphHandle, NodeId, sample_graph,
};

const NODE_COUNTS: &[usize] = &[50, 100, 200, 500, 1000, 5000, 10000];
const SAMPLE_SEED: usize = 42;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let (node_count, set_node_count) = signal(100usize);
	let (query, set_query) = signal(String::new());
	let (selected, set_selected) = signal(None::<NodeId>);
	let graph_data = Signal::derive(move || sample_graph(node_count.get(), SAMPLE_SEED));
	let handle = GraphHandle::new();

	let command = |run: fn(&mut GraphHandle)| {
		let mut handle = handle.clone();
		move |_: MouseEvent| run(&mut handle)
	};

	view! {
		<div class="fullscreen-graph">
			<DependencyGraph
				data=graph_data
				search_query=Signal::derive(move || Some(query.get()))
				selected_node=Signal::derive(move || selected.get())
				on_node_click={move |id: Option<NodeId>| set_selected.set(id)}
				handle=handle.clone()
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>"Contract Dependencies"</h1>
				<p class="subtitle">
					"Drag nodes to reposition, double-click to pin. Scroll to zoom. Drag background to pan."
				</p>
				<div class="toolbar">
					<button on:click=command(|h| h.zoom_in())>"+"</button>
					<button on:click=command(|h| h.zoom_out())>"-"</button>
					<button on:click=command(|h| h.reset_zoom())>"Reset"</button>
					<input
						type="search"
						placeholder="Search contracts"
						prop:value=query
						on:input=move |ev| set_query.set(event_target_value(&ev))
					/>
					<button on:click=command(|h| h.prev_match())>"Prev"</button>
					<button on:click=command(|h| h.next_match())>"Next"</button>
					<button on:click=command(|h| h.download_svg())>"SVG"</button>
					<button on:click=command(|h| h.download_png())>"PNG"</button>
					<select on:change=move |ev| {
						if let Ok(n) = event_target_value(&ev).parse() {
							set_selected.set(None);
							set_node_count.set(n);
						}
					}>
						{NODE_COUNTS
							.iter()
							.map(|n| {
									view! {
									<option value=n.to_string() selected=*n == 100>
										{format!("{n} contracts")}
									</option>
								}
							})
							.collect_view()}
					</select>
				</div>
				<p class="selection">
					{move || selected.get().map(|id| format!("Selected: {id}")).unwrap_or_default()}
				</p>
			</div>
		</div>
	}
}
