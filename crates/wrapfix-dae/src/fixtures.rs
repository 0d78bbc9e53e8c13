//! Shared test documents.

/// Two materials on two meshes plus an effect no material instantiates.
///
/// - `Floor` samples `tile.png` mirrored on S over [0,2]x[0,1]
/// - `Wall` samples `moss.png` (clamp S, mirror T via extra flags) over
///   [0,1]x[0,2] through an uninstanced polylist keyed by material id
/// - `Effect_Trim` references the tile image directly
pub const SCENE: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<COLLADA xmlns="http://www.collada.org/2005/11/COLLADASchema" version="1.4.1">
  <asset><unit name="meter" meter="1"/><up_axis>Y_UP</up_axis></asset>
  <library_images>
    <image id="tile_png" name="tile_png"><init_from>textures/tile.png</init_from></image>
    <image id="moss_png" name="moss_png"><init_from>moss.png</init_from></image>
  </library_images>
  <library_materials>
    <material id="Floor" name="Floor"><instance_effect url="#Effect_Floor"/></material>
    <material id="Wall" name="Wall"><instance_effect url="#Effect_Wall"/></material>
  </library_materials>
  <library_effects>
    <effect id="Effect_Floor">
      <profile_COMMON>
        <newparam sid="tile-surface"><surface type="2D"><init_from>tile_png</init_from></surface></newparam>
        <newparam sid="tile-sampler"><sampler2D><source>tile-surface</source><wrap_s>MIRROR</wrap_s><wrap_t>WRAP</wrap_t></sampler2D></newparam>
        <technique sid="common"><phong><diffuse><texture texture="tile-sampler" texcoord="CHANNEL0"/></diffuse></phong></technique>
      </profile_COMMON>
    </effect>
    <effect id="Effect_Wall">
      <profile_COMMON>
        <newparam sid="moss-surface"><surface type="2D"><init_from>moss_png</init_from></surface></newparam>
        <newparam sid="moss-sampler">
          <sampler2D>
            <source>moss-surface</source>
            <extra><technique profile="MAYA"><wrapU>0</wrapU><wrapV>1</wrapV><mirrorV>1</mirrorV></technique></extra>
          </sampler2D>
        </newparam>
        <technique sid="common"><lambert><diffuse><texture texture="moss-sampler" texcoord="UVSET0"/></diffuse></lambert></technique>
      </profile_COMMON>
    </effect>
    <effect id="Effect_Trim">
      <profile_COMMON>
        <technique sid="common"><lambert><diffuse><texture texture="tile_png" texcoord="CHANNEL0"/></diffuse></lambert></technique>
      </profile_COMMON>
    </effect>
  </library_effects>
  <library_geometries>
    <geometry id="floor-mesh" name="floor">
      <mesh>
        <source id="floor-pos">
          <float_array id="floor-pos-array" count="9">0 0 0 1 0 0 0 1 0</float_array>
          <technique_common><accessor source="#floor-pos-array" count="3" stride="3"><param name="X" type="float"/><param name="Y" type="float"/><param name="Z" type="float"/></accessor></technique_common>
        </source>
        <source id="floor-uv">
          <float_array id="floor-uv-array" count="6">0 0 2 0 0 1</float_array>
          <technique_common><accessor source="#floor-uv-array" count="3" stride="2"><param name="S" type="float"/><param name="T" type="float"/></accessor></technique_common>
        </source>
        <vertices id="floor-verts"><input semantic="POSITION" source="#floor-pos"/></vertices>
        <triangles material="floor-sym" count="1">
          <input semantic="VERTEX" source="#floor-verts" offset="0"/>
          <input semantic="TEXCOORD" source="#floor-uv" offset="1" set="0"/>
          <p>0 0 1 1 2 2</p>
        </triangles>
      </mesh>
    </geometry>
    <geometry id="wall-mesh" name="wall">
      <mesh>
        <source id="wall-pos">
          <float_array id="wall-pos-array" count="9">0 0 0 0 1 0 0 0 1</float_array>
          <technique_common><accessor source="#wall-pos-array" count="3" stride="3"><param name="X" type="float"/><param name="Y" type="float"/><param name="Z" type="float"/></accessor></technique_common>
        </source>
        <source id="wall-uv">
          <float_array id="wall-uv-array" count="6">0 0 1 0 0 2</float_array>
          <technique_common><accessor source="#wall-uv-array" count="3" stride="2"><param name="S" type="float"/><param name="T" type="float"/></accessor></technique_common>
        </source>
        <vertices id="wall-verts">
          <input semantic="POSITION" source="#wall-pos"/>
          <input semantic="TEXCOORD" source="#wall-uv"/>
        </vertices>
        <polylist material="Wall" count="1">
          <input semantic="VERTEX" source="#wall-verts" offset="0"/>
          <vcount>3</vcount>
          <p>0 1 2</p>
        </polylist>
      </mesh>
    </geometry>
  </library_geometries>
  <library_visual_scenes>
    <visual_scene id="Scene">
      <node id="floor-node">
        <translate sid="location">1 2 3</translate>
        <instance_geometry url="#floor-mesh">
          <bind_material>
            <technique_common>
              <instance_material symbol="floor-sym" target="#Floor">
                <bind_vertex_input semantic="CHANNEL0" input_semantic="TEXCOORD" input_set="0"/>
              </instance_material>
            </technique_common>
          </bind_material>
        </instance_geometry>
      </node>
      <node id="wall-node">
        <matrix sid="transform">1 0 0 4 0 1 0 5 0 0 1 6 0 0 0 1</matrix>
      </node>
    </visual_scene>
  </library_visual_scenes>
  <scene><instance_visual_scene url="#Scene"/></scene>
</COLLADA>
"##;

/// A skinned quad: controller-instanced mesh with a joint hierarchy.
pub const SKINNED: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<COLLADA xmlns="http://www.collada.org/2005/11/COLLADASchema" version="1.4.1">
  <library_images>
    <image id="skin_png"><init_from>skin.png</init_from></image>
  </library_images>
  <library_materials>
    <material id="Skin" name="Skin"><instance_effect url="#Effect_Skin"/></material>
  </library_materials>
  <library_effects>
    <effect id="Effect_Skin">
      <profile_COMMON>
        <newparam sid="skin-surface"><surface type="2D"><init_from>skin_png</init_from></surface></newparam>
        <newparam sid="skin-sampler"><sampler2D><source>skin-surface</source><wrap_s>MIRROR</wrap_s><wrap_t>MIRROR</wrap_t></sampler2D></newparam>
        <technique sid="common"><lambert><diffuse><texture texture="skin-sampler" texcoord="TEX0"/></diffuse></lambert></technique>
      </profile_COMMON>
    </effect>
  </library_effects>
  <library_geometries>
    <geometry id="body-mesh">
      <mesh>
        <source id="body-pos">
          <float_array id="body-pos-array" count="12">1 0 0 0 1 0 0 0 1 -1 -1 0</float_array>
          <technique_common><accessor source="#body-pos-array" count="4" stride="3"/></technique_common>
        </source>
        <source id="body-uv">
          <float_array id="body-uv-array" count="12">-0.5 0 0 0 1 0 1.5 1 9 9 0 -1</float_array>
          <technique_common><accessor source="#body-uv-array" count="6" stride="2"/></technique_common>
        </source>
        <vertices id="body-verts"><input semantic="POSITION" source="#body-pos"/></vertices>
        <tristrips material="skin-sym" count="2">
          <input semantic="VERTEX" source="#body-verts" offset="0"/>
          <input semantic="TEXCOORD" source="#body-uv" offset="1" set="1"/>
          <p>0 0 1 1 2 2 3 3</p>
        </tristrips>
      </mesh>
    </geometry>
  </library_geometries>
  <library_controllers>
    <controller id="body-skin">
      <skin source="#body-mesh">
        <bind_shape_matrix>1 0 0 0.5 0 1 0 0.25 0 0 1 0 0 0 0 1</bind_shape_matrix>
        <source id="body-joints"><Name_array id="body-joints-array" count="1">root</Name_array></source>
        <source id="body-inv-bind">
          <float_array id="body-inv-bind-array" count="16">1 0 0 -1 0 1 0 -2 0 0 1 -3 0 0 0 1</float_array>
          <technique_common><accessor source="#body-inv-bind-array" count="1" stride="16"/></technique_common>
        </source>
        <joints>
          <input semantic="JOINT" source="#body-joints"/>
          <input semantic="INV_BIND_MATRIX" source="#body-inv-bind"/>
        </joints>
      </skin>
    </controller>
  </library_controllers>
  <library_visual_scenes>
    <visual_scene id="Scene">
      <node id="root" sid="root" type="JOINT">
        <matrix sid="transform">2 0 0 1 0 2 0 1 0 0 2 1 0 0 0 1</matrix>
      </node>
      <node id="body">
        <instance_controller url="#body-skin">
          <skeleton>#root</skeleton>
          <bind_material>
            <technique_common>
              <instance_material symbol="skin-sym" target="#Skin">
                <bind_vertex_input semantic="TEX0" input_semantic="TEXCOORD" input_set="1"/>
              </instance_material>
            </technique_common>
          </bind_material>
        </instance_controller>
      </node>
    </visual_scene>
  </library_visual_scenes>
</COLLADA>
"##;
