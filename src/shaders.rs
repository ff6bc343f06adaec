pub mod entity_vert {
    vulkano_shaders::shader! {
        ty: "vertex",
        path: "src/shaders/entity.vert"
    }
}

pub mod entity_frag {
    vulkano_shaders::shader! {
        ty: "fragment",
        path: "src/shaders/entity.frag"
    }
}

pub mod ground_vert {
    vulkano_shaders::shader! {
        ty: "vertex",
        path: "src/shaders/ground.vert"
    }
}

pub mod ground_frag {
    vulkano_shaders::shader! {
        ty: "fragment",
        path: "src/shaders/ground.frag"
    }
}

pub mod gui_vert {
    vulkano_shaders::shader! {
        ty: "vertex",
        path: "src/shaders/gui.vert"
    }
}

pub mod gui_frag {
    vulkano_shaders::shader! {
        ty: "fragment",
        path: "src/shaders/gui.frag"
    }
}
